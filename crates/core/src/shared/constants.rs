/// Width of the reduced frame handed to the detector. Smaller is faster.
pub const PROCESSING_RESOLUTION_WIDTH: u32 = 240;

/// Every capture adapter decodes to RGB24.
pub const FRAME_CHANNELS: u8 = 3;

/// How often an idle scheduler wakes to retry deferred work and check timeouts.
pub const DEFAULT_IDLE_POLL_MS: u64 = 10;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Prefix applied to diagnostic lines forwarded from the detection worker.
pub const WORKER_LOG_PREFIX: &str = "worker:";
