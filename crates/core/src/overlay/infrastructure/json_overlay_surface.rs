use std::io::Write;

use serde::Serialize;

use crate::overlay::domain::cutout_mask::CutoutMask;
use crate::overlay::domain::overlay_surface::OverlaySurface;
use crate::overlay::infrastructure::svg_mask;
use crate::shared::face::DisplayRect;

/// One display instruction, serialized as a JSON line.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OverlayCommand {
    Clear,
    Highlight {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Mask {
        regions: Vec<DisplayRect>,
        #[serde(rename = "maskImage")]
        mask_image: String,
    },
}

/// Streams overlay instructions to any writer, one JSON object per line,
/// for a display process that owns the actual rendering.
pub struct JsonOverlaySurface<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonOverlaySurface<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, command: &OverlayCommand) -> Result<(), Box<dyn std::error::Error>> {
        serde_json::to_writer(&mut self.writer, command)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> OverlaySurface for JsonOverlaySurface<W> {
    fn clear_highlights(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.emit(&OverlayCommand::Clear)
    }

    fn add_highlight(&mut self, rect: &DisplayRect) -> Result<(), Box<dyn std::error::Error>> {
        self.emit(&OverlayCommand::Highlight {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        })
    }

    fn apply_mask(&mut self, mask: &CutoutMask) -> Result<(), Box<dyn std::error::Error>> {
        self.emit(&OverlayCommand::Mask {
            regions: mask.regions().to_vec(),
            mask_image: svg_mask::to_mask_image(mask),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn lines(surface: JsonOverlaySurface<Vec<u8>>) -> Vec<Value> {
        String::from_utf8(surface.into_inner())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_commands_are_json_lines() {
        let mut surface = JsonOverlaySurface::new(Vec::new());
        surface.clear_highlights().unwrap();
        surface
            .add_highlight(&DisplayRect::new(240.0, 180.0, 96.0, 72.0))
            .unwrap();

        let out = lines(surface);
        assert_eq!(out[0]["op"], "clear");
        assert_eq!(out[1]["op"], "highlight");
        assert_eq!(out[1]["x"], 240.0);
        assert_eq!(out[1]["height"], 72.0);
    }

    #[test]
    fn test_mask_command_carries_regions_and_image() {
        let mut surface = JsonOverlaySurface::new(Vec::new());
        let mask = CutoutMask::around(&DisplayRect::new(10.0, 10.0, 5.0, 5.0), 64.0, 48.0);
        surface.apply_mask(&mask).unwrap();

        let out = lines(surface);
        assert_eq!(out[0]["op"], "mask");
        assert_eq!(out[0]["regions"].as_array().unwrap().len(), 4);
        assert!(out[0]["maskImage"]
            .as_str()
            .unwrap()
            .starts_with("url(data:image/svg+xml;base64,"));
    }
}
