pub mod pipeline_config;
pub mod pipeline_logger;
pub mod pipeline_scheduler;
pub mod throughput;
