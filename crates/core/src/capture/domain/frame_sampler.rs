use ndarray::s;

use crate::capture::domain::video_source::VideoSource;
use crate::shared::errors::PipelineError;
use crate::shared::frame::Frame;
use crate::shared::raw_frame_payload::RawFramePayload;
use crate::shared::stream_settings::StreamSettings;

/// Offscreen raster the current video frame is painted into before detection.
///
/// Sized `native * scale` where `scale = target_width / native_width`. The
/// scale and the dimensions are derived together and never change afterwards.
#[derive(Debug)]
pub struct ReducedFrameBuffer {
    frame: Frame,
    scale: f64,
}

impl ReducedFrameBuffer {
    pub fn for_stream(
        settings: &StreamSettings,
        target_width: u32,
        channels: u8,
    ) -> Result<Self, PipelineError> {
        if settings.width == 0 || settings.height == 0 || target_width == 0 {
            return Err(PipelineError::InvalidStreamSettings {
                width: settings.width,
                height: settings.height,
            });
        }

        let scale = target_width as f64 / settings.width as f64;
        let width = ((settings.width as f64 * scale).round() as u32).max(1);
        let height = ((settings.height as f64 * scale).round() as u32).max(1);

        Ok(Self {
            frame: Frame::blank(width, height, channels),
            scale,
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }
}

/// Paints the current video frame into a [`ReducedFrameBuffer`] with
/// nearest-neighbour resampling and extracts it as a detector payload.
///
/// Source-to-buffer index tables are cached and rebuilt only when the source
/// frame size changes.
pub struct FrameSampler {
    x_map: Vec<usize>,
    y_map: Vec<usize>,
    mapped_for: Option<(u32, u32, u32, u32)>,
    next_sequence: u64,
}

impl FrameSampler {
    pub fn new() -> Self {
        Self {
            x_map: Vec::new(),
            y_map: Vec::new(),
            mapped_for: None,
            next_sequence: 0,
        }
    }

    pub fn sample(
        &mut self,
        video: &mut dyn VideoSource,
        buffer: &mut ReducedFrameBuffer,
    ) -> Result<RawFramePayload, PipelineError> {
        let source = video.current_frame()?;
        self.paint(source, &mut buffer.frame)?;

        let payload = RawFramePayload::new(
            buffer.frame.data().to_vec(),
            buffer.frame.width(),
            buffer.frame.height(),
            buffer.frame.channels(),
            self.next_sequence,
        );
        self.next_sequence += 1;
        Ok(payload)
    }

    /// Number of payloads produced so far.
    pub fn sampled(&self) -> u64 {
        self.next_sequence
    }

    fn paint(&mut self, source: &Frame, target: &mut Frame) -> Result<(), PipelineError> {
        if source.channels() != target.channels() {
            return Err(PipelineError::Source(format!(
                "frame has {} channels, buffer expects {}",
                source.channels(),
                target.channels()
            )));
        }
        if source.width() == 0 || source.height() == 0 {
            return Err(PipelineError::NoFrameAvailable);
        }

        self.ensure_maps(source.width(), source.height(), target.width(), target.height());

        let src = source.as_ndarray();
        let mut dst = target.as_ndarray_mut();
        for (dy, &sy) in self.y_map.iter().enumerate() {
            for (dx, &sx) in self.x_map.iter().enumerate() {
                dst.slice_mut(s![dy, dx, ..])
                    .assign(&src.slice(s![sy, sx, ..]));
            }
        }

        target.set_index(source.index());
        Ok(())
    }

    fn ensure_maps(&mut self, src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) {
        let key = (src_w, src_h, dst_w, dst_h);
        if self.mapped_for == Some(key) {
            return;
        }
        self.x_map = nearest_indices(src_w, dst_w);
        self.y_map = nearest_indices(src_h, dst_h);
        self.mapped_for = Some(key);
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Source index sampled by each destination index, using pixel centres.
fn nearest_indices(src_len: u32, dst_len: u32) -> Vec<usize> {
    let ratio = src_len as f64 / dst_len as f64;
    let last = src_len as usize - 1;
    (0..dst_len as usize)
        .map(|d| (((d as f64 + 0.5) * ratio) as usize).min(last))
        .collect()
}
