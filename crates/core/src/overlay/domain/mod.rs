pub mod coordinate_mapper;
pub mod cutout_mask;
pub mod overlay_renderer;
pub mod overlay_surface;
