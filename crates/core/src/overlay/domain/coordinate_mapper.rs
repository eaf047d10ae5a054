use crate::shared::face::{DisplayRect, Face};

/// Maps reduced-frame detections back to display space by dividing every
/// spatial field by the stream's scale factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    scale: f64,
}

impl CoordinateMapper {
    /// `scale` must be finite and positive.
    pub fn new(scale: f64) -> Self {
        debug_assert!(
            scale.is_finite() && scale > 0.0,
            "scale must be positive, got {scale}"
        );
        Self { scale }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn to_display(&self, face: &Face) -> DisplayRect {
        DisplayRect::new(
            face.x / self.scale,
            face.y / self.scale,
            face.width / self.scale,
            face.height / self.scale,
        )
    }

    /// Inverse of [`Self::to_display`].
    pub fn to_detection(&self, rect: &DisplayRect) -> Face {
        Face::new(
            rect.x * self.scale,
            rect.y * self.scale,
            rect.width * self.scale,
            rect.height * self.scale,
        )
    }

    pub fn map_all(&self, faces: &[Face]) -> Vec<DisplayRect> {
        faces.iter().map(|f| self.to_display(f)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_quarter_scale_maps_to_native_pixels() {
        // 960x720 stream reduced to 240 wide.
        let mapper = CoordinateMapper::new(240.0 / 960.0);
        let rect = mapper.to_display(&Face::new(60.0, 45.0, 24.0, 18.0));
        assert_eq!(rect, DisplayRect::new(240.0, 180.0, 96.0, 72.0));
    }

    #[rstest]
    #[case::vga(640)]
    #[case::hd(1280)]
    #[case::odd_width(1023)]
    #[case::smaller_than_target(200)]
    fn test_round_trip_recovers_face(#[case] native_width: u32) {
        let mapper = CoordinateMapper::new(240.0 / native_width as f64);
        let face = Face::new(13.5, 71.25, 33.0, 41.75);
        let back = mapper.to_detection(&mapper.to_display(&face));
        assert_relative_eq!(back.x, face.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, face.y, epsilon = 1e-9);
        assert_relative_eq!(back.width, face.width, epsilon = 1e-9);
        assert_relative_eq!(back.height, face.height, epsilon = 1e-9);
    }

    #[test]
    fn test_map_all_preserves_order_and_count() {
        let mapper = CoordinateMapper::new(0.5);
        let rects = mapper.map_all(&[
            Face::new(1.0, 2.0, 3.0, 4.0),
            Face::new(10.0, 20.0, 30.0, 40.0),
        ]);
        assert_eq!(rects.len(), 2);
        assert_relative_eq!(rects[0].x, 2.0);
        assert_relative_eq!(rects[1].height, 80.0);
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let mapper = CoordinateMapper::new(0.3);
        let face = Face::new(7.0, 8.0, 9.0, 10.0);
        assert_eq!(mapper.to_display(&face), mapper.to_display(&face));
    }

    #[test]
    #[should_panic(expected = "scale must be positive")]
    fn test_zero_scale_is_a_precondition_violation() {
        CoordinateMapper::new(0.0);
    }

    #[test]
    #[should_panic(expected = "scale must be positive")]
    fn test_negative_scale_is_a_precondition_violation() {
        CoordinateMapper::new(-0.25);
    }
}
