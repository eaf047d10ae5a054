use std::path::Path;

use crate::capture::domain::video_source::VideoSource;
use crate::shared::errors::PipelineError;
use crate::shared::frame::Frame;
use crate::shared::stream_settings::StreamSettings;

/// Presents a still image as a live stream that never ends.
///
/// Every sample sees the same pixels; the frame index still advances so
/// downstream logging can tell cycles apart.
pub struct ImageFileSource {
    frame: Frame,
}

impl ImageFileSource {
    pub fn open(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let img = image::open(path)?.to_rgb8();
        let (width, height) = img.dimensions();
        Ok(Self::from_frame(Frame::new(img.into_raw(), width, height, 3, 0)))
    }

    pub fn from_frame(frame: Frame) -> Self {
        Self { frame }
    }
}

impl VideoSource for ImageFileSource {
    fn settings(&self) -> StreamSettings {
        StreamSettings::new(self.frame.width(), self.frame.height(), 0.0)
    }

    fn current_frame(&mut self) -> Result<&Frame, PipelineError> {
        let next = self.frame.index() + 1;
        self.frame.set_index(next);
        Ok(&self.frame)
    }
}
