use crate::detection::domain::detection_channel::{DetectionChannel, WorkerEndpoint};
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::worker_message::WorkerMessage;

type DetectorFactory =
    Box<dyn FnOnce() -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> + Send>;

/// Runs a [`FaceDetector`] on a dedicated thread behind a [`DetectionChannel`].
///
/// The detector is built on the worker thread (model loading can be slow),
/// after which the worker announces itself with `init`. A detector error is
/// logged and answered with an empty result so no request goes unanswered.
pub fn spawn_thread_worker<F>(factory: F) -> DetectionChannel
where
    F: FnOnce() -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> + Send + 'static,
{
    let (channel, endpoint) = DetectionChannel::connect();
    let factory: DetectorFactory = Box::new(factory);
    std::thread::spawn(move || run_worker(factory, endpoint));
    channel
}

fn run_worker(factory: DetectorFactory, endpoint: WorkerEndpoint) {
    let mut detector = match factory() {
        Ok(detector) => detector,
        Err(e) => {
            let _ = endpoint
                .messages
                .send(WorkerMessage::log([format!("detector failed to initialize: {e}")]));
            return;
        }
    };

    if endpoint.messages.send(WorkerMessage::Init).is_err() {
        return;
    }

    for payload in endpoint.requests.iter() {
        let faces = match detector.detect(&payload) {
            Ok(faces) => faces,
            Err(e) => {
                let _ = endpoint.messages.send(WorkerMessage::log([format!(
                    "detection failed for frame {}: {e}",
                    payload.sequence()
                )]));
                Vec::new()
            }
        };
        drop(payload);

        if endpoint
            .messages
            .send(WorkerMessage::DetectFaces { faces })
            .is_err()
        {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face::Face;
    use crate::shared::raw_frame_payload::RawFramePayload;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    /// Reports one face whose x equals the frame's sequence number.
    struct EchoDetector;

    impl FaceDetector for EchoDetector {
        fn detect(
            &mut self,
            frame: &RawFramePayload,
        ) -> Result<Vec<Face>, Box<dyn std::error::Error>> {
            Ok(vec![Face::new(frame.sequence() as f64, 0.0, 1.0, 1.0)])
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect(
            &mut self,
            _frame: &RawFramePayload,
        ) -> Result<Vec<Face>, Box<dyn std::error::Error>> {
            Err("model exploded".into())
        }
    }

    fn payload(seq: u64) -> RawFramePayload {
        RawFramePayload::new(vec![0u8; 12], 2, 2, 3, seq)
    }

    fn next(channel: &DetectionChannel) -> WorkerMessage {
        channel.messages().recv_timeout(WAIT).unwrap()
    }

    #[test]
    fn test_worker_announces_init_first() {
        let channel = spawn_thread_worker(|| Ok(Box::new(EchoDetector) as Box<dyn FaceDetector>));
        assert_eq!(next(&channel), WorkerMessage::Init);
    }

    #[test]
    fn test_results_follow_request_order() {
        let channel = spawn_thread_worker(|| Ok(Box::new(EchoDetector) as Box<dyn FaceDetector>));
        assert_eq!(next(&channel), WorkerMessage::Init);

        channel.send(payload(1)).unwrap();
        channel.send(payload(2)).unwrap();

        for expected in [1.0, 2.0] {
            match next(&channel) {
                WorkerMessage::DetectFaces { faces } => assert_eq!(faces[0].x, expected),
                other => panic!("unexpected message {other:?}"),
            }
        }
    }

    #[test]
    fn test_detector_error_is_logged_and_answered_empty() {
        let channel =
            spawn_thread_worker(|| Ok(Box::new(FailingDetector) as Box<dyn FaceDetector>));
        assert_eq!(next(&channel), WorkerMessage::Init);

        channel.send(payload(0)).unwrap();
        assert!(matches!(next(&channel), WorkerMessage::Log { .. }));
        assert_eq!(next(&channel), WorkerMessage::DetectFaces { faces: vec![] });
    }

    #[test]
    fn test_factory_failure_logs_and_disconnects() {
        let channel = spawn_thread_worker(|| Err("weights missing".into()));
        match next(&channel) {
            WorkerMessage::Log { args } => {
                assert!(args[0].as_str().unwrap().contains("weights missing"))
            }
            other => panic!("unexpected message {other:?}"),
        }
        assert!(channel.messages().recv_timeout(WAIT).is_err());
    }
}
