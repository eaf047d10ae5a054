use std::time::Duration;

use thiserror::Error;

/// Failure kinds surfaced by the frame pipeline.
///
/// Only stream-lifecycle failures (`StreamTerminated`, `DetectorDisconnected`)
/// stop the pipeline; the rest are per-cycle and are logged and skipped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("no video frame available yet")]
    NoFrameAvailable,
    #[error("detector did not answer within {waited:?}")]
    DetectorUnresponsive { waited: Duration },
    #[error("video stream terminated: {0}")]
    StreamTerminated(String),
    #[error("detection channel disconnected")]
    DetectorDisconnected,
    #[error("invalid stream settings {width}x{height}")]
    InvalidStreamSettings { width: u32, height: u32 },
    #[error("video source error: {0}")]
    Source(String),
}

impl PipelineError {
    /// Whether the error ends the pipeline rather than a single cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::StreamTerminated(_)
                | PipelineError::DetectorDisconnected
                | PipelineError::InvalidStreamSettings { .. }
        )
    }
}
