pub mod frame_sampler;
pub mod pipeline_context;
pub mod video_source;
