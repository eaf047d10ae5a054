pub mod detection_channel;
pub mod face_detector;
pub mod worker_message;
