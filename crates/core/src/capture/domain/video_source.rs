use crate::shared::errors::PipelineError;
use crate::shared::frame::Frame;
use crate::shared::stream_settings::StreamSettings;

/// A live video stream the pipeline samples from.
///
/// Owned by the application; the pipeline only reads from it. Unlike a file
/// reader there is no iteration: each call yields whatever frame is current.
pub trait VideoSource: Send {
    /// Native stream geometry. Fixed for the lifetime of the source.
    fn settings(&self) -> StreamSettings;

    /// The most recently decoded frame.
    ///
    /// Returns [`PipelineError::NoFrameAvailable`] before the first frame is
    /// decoded and [`PipelineError::StreamTerminated`] once the stream ended.
    fn current_frame(&mut self) -> Result<&Frame, PipelineError>;
}
