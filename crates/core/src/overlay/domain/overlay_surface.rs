use crate::overlay::domain::cutout_mask::CutoutMask;
use crate::shared::face::DisplayRect;

/// Display collaborator that materializes overlay artifacts.
///
/// Positions and sizes are pixels relative to the video's origin; how the
/// artifacts are drawn is up to the implementation.
pub trait OverlaySurface: Send {
    /// Removes every highlight box created so far.
    fn clear_highlights(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    fn add_highlight(&mut self, rect: &DisplayRect) -> Result<(), Box<dyn std::error::Error>>;

    /// Replaces the clip of the overlay layer.
    fn apply_mask(&mut self, mask: &CutoutMask) -> Result<(), Box<dyn std::error::Error>>;
}
