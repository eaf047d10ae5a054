use std::io::{BufRead, BufReader, BufWriter, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crossbeam_channel::{Receiver, Sender};

use crate::detection::domain::detection_channel::{DetectionChannel, WorkerEndpoint};
use crate::detection::domain::worker_message::{DetectorRequest, WorkerMessage};
use crate::shared::raw_frame_payload::RawFramePayload;

/// Runs an external detector program behind a [`DetectionChannel`].
///
/// The program reads one `frame` request per line on stdin and writes
/// worker messages, one JSON document per line, on stdout. Its stderr is
/// inherited. When the program exits the channel reports a disconnect.
pub fn spawn_process_worker(
    command: &[String],
) -> Result<DetectionChannel, Box<dyn std::error::Error>> {
    let (program, args) = command
        .split_first()
        .ok_or("Detector command must not be empty")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| format!("Failed to start detector '{program}': {e}"))?;

    let stdin = child.stdin.take().ok_or("Detector stdin unavailable")?;
    let stdout = child.stdout.take().ok_or("Detector stdout unavailable")?;
    log::info!("Started detector process '{program}' (pid {})", child.id());

    let (channel, WorkerEndpoint { requests, messages }) = DetectionChannel::connect();
    std::thread::spawn(move || write_requests(stdin, requests));
    std::thread::spawn(move || read_messages(stdout, messages));

    Ok(channel.with_worker(DetectorProcess { child }))
}

/// Owns the child process; stops it if it outlives the channel.
struct DetectorProcess {
    child: Child,
}

impl Drop for DetectorProcess {
    fn drop(&mut self) {
        match self.child.try_wait() {
            Ok(Some(status)) => log::debug!("Detector process exited with {status}"),
            _ => {
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
        }
    }
}

fn write_requests(stdin: ChildStdin, requests: Receiver<RawFramePayload>) {
    let mut writer = BufWriter::new(stdin);
    for payload in requests {
        let request = DetectorRequest::frame(&payload);
        drop(payload);

        let written = serde_json::to_writer(&mut writer, &request)
            .map_err(std::io::Error::from)
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush());
        if let Err(e) = written {
            log::warn!("Failed to write frame to detector: {e}");
            break;
        }
    }
}

fn read_messages(stdout: ChildStdout, messages: Sender<WorkerMessage>) {
    for line in BufReader::new(stdout).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Failed to read from detector: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<WorkerMessage>(&line) {
            Ok(msg) => {
                if messages.send(msg).is_err() {
                    break;
                }
            }
            Err(e) => log::warn!("Ignoring unparseable detector output ({e}): {line}"),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::shared::face::Face;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    #[test]
    fn test_empty_command_errors() {
        assert!(spawn_process_worker(&[]).is_err());
    }

    #[test]
    fn test_missing_program_errors() {
        assert!(spawn_process_worker(&["/nonexistent/detector".to_string()]).is_err());
    }

    #[test]
    fn test_round_trip_with_line_protocol() {
        let script = r#"echo '{"type":"init"}'
while read line; do
  echo '{"type":"detect_faces","faces":[{"x":1,"y":2,"width":3,"height":4}]}'
done"#;
        let channel = spawn_process_worker(&sh(script)).unwrap();
        assert_eq!(
            channel.messages().recv_timeout(WAIT).unwrap(),
            WorkerMessage::Init
        );

        channel
            .send(RawFramePayload::new(vec![0u8; 3], 1, 1, 3, 0))
            .unwrap();
        assert_eq!(
            channel.messages().recv_timeout(WAIT).unwrap(),
            WorkerMessage::DetectFaces {
                faces: vec![Face::new(1.0, 2.0, 3.0, 4.0)]
            }
        );
    }

    #[test]
    fn test_garbage_lines_are_skipped() {
        let script = r#"echo 'loading weights...'
echo '{"type":"log","args":["ready"]}'"#;
        let channel = spawn_process_worker(&sh(script)).unwrap();
        assert_eq!(
            channel.messages().recv_timeout(WAIT).unwrap(),
            WorkerMessage::log(["ready"])
        );
    }

    #[test]
    fn test_process_exit_disconnects_channel() {
        let channel = spawn_process_worker(&sh("exit 0")).unwrap();
        assert!(channel.messages().recv_timeout(WAIT).is_err());
    }
}
