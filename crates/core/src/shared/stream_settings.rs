/// Native geometry of a live video stream, read once at acquisition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamSettings {
    pub width: u32,
    pub height: u32,
    /// Nominal frame rate; `0.0` when the source does not advertise one.
    pub fps: f64,
}

impl StreamSettings {
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self { width, height, fps }
    }
}
