/// Raw pixel bytes of one reduced frame, handed to the detector.
///
/// Deliberately not `Clone`: sending moves the bytes into the detection
/// channel, so the producer cannot read them after the hand-off.
#[derive(Debug, PartialEq)]
pub struct RawFramePayload {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    sequence: u64,
}

impl RawFramePayload {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, sequence: u64) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "payload length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            sequence,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Monotonic request number assigned by the sampler.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}
