use std::fmt::Write as _;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::overlay::domain::cutout_mask::CutoutMask;

/// Renders the mask as an SVG document with one `<rect>` per visible region.
pub fn to_svg(mask: &CutoutMask) -> String {
    let mut svg = format!(
        r#"<svg version="1.0" xmlns="http://www.w3.org/2000/svg" width="{}px" height="{}px">"#,
        mask.width(),
        mask.height()
    );
    for r in mask.regions() {
        let _ = write!(
            svg,
            r#"<rect x="{}" y="{}" width="{}" height="{}"/>"#,
            r.x, r.y, r.width, r.height
        );
    }
    svg.push_str("</svg>");
    svg
}

/// CSS `mask-image` value embedding the SVG as a base64 data URL.
pub fn to_mask_image(mask: &CutoutMask) -> String {
    format!(
        "url(data:image/svg+xml;base64,{})",
        STANDARD.encode(to_svg(mask))
    )
}

pub fn write_svg(mask: &CutoutMask, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, to_svg(mask))
}
