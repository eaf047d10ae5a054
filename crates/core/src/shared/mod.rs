pub mod constants;
pub mod errors;
pub mod face;
pub mod frame;
pub mod raw_frame_payload;
pub mod stream_settings;
