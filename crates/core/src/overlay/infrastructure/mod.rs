pub mod json_overlay_surface;
pub mod svg_mask;
