use crate::overlay::domain::cutout_mask::CutoutMask;
use crate::overlay::domain::overlay_surface::OverlaySurface;
use crate::shared::face::DisplayRect;

/// How the cutout mask of the overlay layer is derived from the faces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaskPolicy {
    /// No mask is ever applied.
    Disabled,
    /// One mask per face, each replacing the previous one; only the last
    /// face of a result stays cut out.
    ReplacePerFace,
    /// A single mask excluding every face.
    #[default]
    Union,
}

/// Turns display-space face rects into highlight boxes and, when enabled,
/// a cutout mask on the overlay layer.
///
/// Every render fully replaces the previous highlights; face counts are
/// small enough that diffing is not worth it.
pub struct OverlayRenderer {
    surface: Box<dyn OverlaySurface>,
    policy: MaskPolicy,
    canvas_width: f64,
    canvas_height: f64,
    last_mask: Option<CutoutMask>,
}

impl OverlayRenderer {
    pub fn new(
        surface: Box<dyn OverlaySurface>,
        policy: MaskPolicy,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Self {
        Self {
            surface,
            policy,
            canvas_width: canvas_width as f64,
            canvas_height: canvas_height as f64,
            last_mask: None,
        }
    }

    pub fn render(&mut self, faces: &[DisplayRect]) -> Result<(), Box<dyn std::error::Error>> {
        self.surface.clear_highlights()?;
        for rect in faces {
            self.surface.add_highlight(rect)?;
        }

        match self.policy {
            MaskPolicy::Disabled => {}
            MaskPolicy::ReplacePerFace if !faces.is_empty() => {
                for rect in faces {
                    let mask = CutoutMask::around(rect, self.canvas_width, self.canvas_height);
                    self.surface.apply_mask(&mask)?;
                    self.last_mask = Some(mask);
                }
            }
            MaskPolicy::ReplacePerFace | MaskPolicy::Union => {
                let mask = CutoutMask::around_all(faces, self.canvas_width, self.canvas_height);
                self.surface.apply_mask(&mask)?;
                self.last_mask = Some(mask);
            }
        }
        Ok(())
    }

    /// The mask most recently applied to the overlay layer.
    pub fn last_mask(&self) -> Option<&CutoutMask> {
        self.last_mask.as_ref()
    }
}
