use crate::shared::face::Face;
use crate::shared::raw_frame_payload::RawFramePayload;

/// The face-finding capability run by a detection worker.
///
/// How faces are found is up to the implementation; the pipeline only
/// relies on the returned rectangles being in reduced-frame pixels.
/// Implementations may keep state between frames, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &RawFramePayload)
        -> Result<Vec<Face>, Box<dyn std::error::Error>>;
}
