use crate::capture::domain::frame_sampler::{FrameSampler, ReducedFrameBuffer};
use crate::capture::domain::video_source::VideoSource;
use crate::shared::constants::FRAME_CHANNELS;
use crate::shared::errors::PipelineError;
use crate::shared::raw_frame_payload::RawFramePayload;
use crate::shared::stream_settings::StreamSettings;

/// Everything tied to one acquired video stream: the source, the reduced
/// buffer and its scale, and the sampler.
///
/// Created when the stream is acquired and dropped when it terminates, so
/// the scale can never outlive the stream it was derived from.
pub struct PipelineContext {
    source: Box<dyn VideoSource>,
    settings: StreamSettings,
    buffer: ReducedFrameBuffer,
    sampler: FrameSampler,
}

impl PipelineContext {
    pub fn acquire(
        source: Box<dyn VideoSource>,
        processing_width: u32,
    ) -> Result<Self, PipelineError> {
        let settings = source.settings();
        let buffer = ReducedFrameBuffer::for_stream(&settings, processing_width, FRAME_CHANNELS)?;
        log::debug!(
            "Stream acquired at {}x{}, reduced buffer {}x{} (scale {:.4})",
            settings.width,
            settings.height,
            buffer.width(),
            buffer.height(),
            buffer.scale()
        );
        Ok(Self {
            source,
            settings,
            buffer,
            sampler: FrameSampler::new(),
        })
    }

    pub fn sample(&mut self) -> Result<RawFramePayload, PipelineError> {
        self.sampler.sample(self.source.as_mut(), &mut self.buffer)
    }

    pub fn scale(&self) -> f64 {
        self.buffer.scale()
    }

    /// Native stream geometry; also the display canvas size.
    pub fn settings(&self) -> StreamSettings {
        self.settings
    }

    pub fn reduced_size(&self) -> (u32, u32) {
        (self.buffer.width(), self.buffer.height())
    }
}
