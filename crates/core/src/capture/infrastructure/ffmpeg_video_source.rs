use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

use crate::capture::domain::video_source::VideoSource;
use crate::shared::errors::PipelineError;
use crate::shared::frame::Frame;
use crate::shared::stream_settings::StreamSettings;

/// Decoded frames held between the decode thread and the sampler. Older
/// frames are evicted so the slot always carries the newest one.
const FRAME_QUEUE_CAPACITY: usize = 1;

type DecodedFrame = Result<Frame, String>;

/// Live source backed by ffmpeg-next (libavformat + libavcodec).
///
/// Decoding runs on its own thread, paced at the stream frame rate, so the
/// source behaves like a camera: [`VideoSource::current_frame`] returns the
/// newest decoded frame and frames the sampler was too slow for are dropped.
pub struct FfmpegVideoSource {
    settings: StreamSettings,
    frames: Receiver<DecodedFrame>,
    current: Option<Frame>,
    stop: Arc<AtomicBool>,
    decoder: Option<JoinHandle<()>>,
}

impl FfmpegVideoSource {
    /// Opens a device or media path and blocks until its geometry is known.
    pub fn open(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let (settings_tx, settings_rx) = crossbeam_channel::bounded(1);
        let (frame_tx, frame_rx) = crossbeam_channel::bounded(FRAME_QUEUE_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));

        let path: PathBuf = path.to_path_buf();
        let stop_decoder = stop.clone();
        let evict_rx = frame_rx.clone();
        let decoder = std::thread::spawn(move || {
            let slot = LatestSlot {
                tx: frame_tx,
                rx: evict_rx,
            };
            if let Err(e) = run_decoder(&path, &settings_tx, &slot, &stop_decoder) {
                log::warn!("Decoder for {} stopped: {e}", path.display());
                let _ = settings_tx.try_send(Err(e.to_string()));
            }
        });

        let settings = settings_rx
            .recv()
            .map_err(|_| "Decoder thread exited before reporting stream settings")??;

        log::info!(
            "Opened video source {}x{} @ {:.2} fps",
            settings.width,
            settings.height,
            settings.fps
        );

        Ok(Self {
            settings,
            frames: frame_rx,
            current: None,
            stop,
            decoder: Some(decoder),
        })
    }
}

impl VideoSource for FfmpegVideoSource {
    fn settings(&self) -> StreamSettings {
        self.settings
    }

    fn current_frame(&mut self) -> Result<&Frame, PipelineError> {
        let mut received = false;
        loop {
            match self.frames.try_recv() {
                Ok(Ok(frame)) => {
                    self.current = Some(frame);
                    received = true;
                }
                Ok(Err(message)) => return Err(PipelineError::Source(message)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if received {
                        break;
                    }
                    self.current = None;
                    return Err(PipelineError::StreamTerminated("end of stream".into()));
                }
            }
        }
        self.current.as_ref().ok_or(PipelineError::NoFrameAvailable)
    }
}

impl Drop for FfmpegVideoSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.decoder.take() {
            if handle.join().is_err() {
                log::error!("Decoder thread panicked");
            }
        }
    }
}

/// Releases decoded frames no faster than the nominal stream rate.
struct Pacer {
    started: Instant,
    interval: Option<Duration>,
    emitted: u32,
}

impl Pacer {
    fn new(fps: f64) -> Self {
        Self {
            started: Instant::now(),
            interval: (fps > 0.0).then(|| Duration::from_secs_f64(1.0 / fps)),
            emitted: 0,
        }
    }

    fn wait(&mut self) {
        if let Some(interval) = self.interval {
            let due = self.started + interval * self.emitted;
            let now = Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            }
        }
        self.emitted = self.emitted.saturating_add(1);
    }
}

/// Single-producer queue that drops the oldest entry instead of the newest.
///
/// The producer keeps a receiver of its own, so a consumer going away is
/// not reported through the channel; the decoder watches the stop flag
/// for that.
struct LatestSlot<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> LatestSlot<T> {
    /// Publishes `item`, evicting stale entries until it fits.
    fn publish(&self, mut item: T) {
        loop {
            match self.tx.try_send(item) {
                Ok(()) => return,
                Err(TrySendError::Full(back)) => {
                    let _ = self.rx.try_recv();
                    item = back;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

struct DecodeState {
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    next_index: usize,
    pacer: Pacer,
}

impl DecodeState {
    /// Publishes every frame the decoder has ready. Returns `false` once the
    /// source has been dropped.
    fn drain(&mut self, slot: &LatestSlot<DecodedFrame>, stop: &AtomicBool) -> bool {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
            let item = match self.scaler.run(&decoded, &mut rgb_frame) {
                Ok(()) => {
                    let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
                    Ok(Frame::new(pixels, self.width, self.height, 3, self.next_index))
                }
                Err(e) => Err(e.to_string()),
            };
            self.next_index += 1;
            self.pacer.wait();

            if stop.load(Ordering::Relaxed) {
                return false;
            }
            slot.publish(item);
        }
        true
    }
}

fn run_decoder(
    path: &Path,
    settings_tx: &Sender<Result<StreamSettings, String>>,
    slot: &LatestSlot<DecodedFrame>,
    stop: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error>> {
    ffmpeg_next::init()?;
    ffmpeg_next::device::register_all();

    let mut ictx = ffmpeg_next::format::input(&path)?;

    let (video_stream_index, fps, parameters) = {
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        (stream.index(), fps, stream.parameters())
    };

    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(parameters)?;
    let decoder = codec_ctx.decoder().video()?;
    let width = decoder.width();
    let height = decoder.height();

    let scaler = ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        width,
        height,
        ffmpeg_next::format::Pixel::RGB24,
        width,
        height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )?;

    let _ = settings_tx.send(Ok(StreamSettings::new(width, height, fps)));

    let mut state = DecodeState {
        decoder,
        scaler,
        width,
        height,
        next_index: 0,
        pacer: Pacer::new(fps),
    };

    for (stream, packet) in ictx.packets() {
        if stop.load(Ordering::Relaxed) {
            return Ok(());
        }
        if stream.index() != video_stream_index {
            continue;
        }
        if state.decoder.send_packet(&packet).is_err() {
            continue;
        }
        if !state.drain(slot, stop) {
            return Ok(());
        }
    }

    let _ = state.decoder.send_eof();
    state.drain(slot, stop);
    log::debug!("Decoder reached end of stream after {} frames", state.next_index);
    Ok(())
}

fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    pixels
}
