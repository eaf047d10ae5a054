use ndarray::{ArrayView3, ArrayViewMut3};

/// A decoded video frame: contiguous interleaved bytes in row-major order.
///
/// Sources decode to RGB24, so `channels` is 3 for everything produced by the
/// capture adapters; the sampler only requires source and buffer to agree.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Allocates a zeroed frame, used for offscreen buffers that are painted later.
    pub fn blank(width: u32, height: u32, channels: u8) -> Self {
        let len = (width as usize) * (height as usize) * (channels as usize);
        Self::new(vec![0u8; len], width, height, channels, 0)
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

    /// Decode order of the frame within its stream.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_frame_is_zeroed_and_sized() {
        let frame = Frame::blank(4, 3, 3);
        assert_eq!(frame.data().len(), 36);
        assert!(frame.data().iter().all(|&b| b == 0));
        assert_eq!(frame.index(), 0);
    }

    #[test]
    fn test_set_index() {
        let mut frame = Frame::blank(1, 1, 3);
        frame.set_index(42);
        assert_eq!(frame.index(), 42);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_ndarray_view_is_height_width_channels() {
        let mut data = vec![0u8; 24]; // 4x2 RGB
        data[(4 + 1) * 3 + 2] = 7; // row=1, col=1, B
        let frame = Frame::new(data, 4, 2, 3, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]);
        assert_eq!(arr[[1, 1, 2]], 7);
    }

    #[test]
    fn test_ndarray_mut_writes_through() {
        let mut frame = Frame::blank(2, 2, 3);
        frame.as_ndarray_mut()[[0, 1, 0]] = 200;
        assert_eq!(frame.data()[3], 200);
    }
}
