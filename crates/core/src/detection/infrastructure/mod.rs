pub mod process_worker;
pub mod thread_worker;
