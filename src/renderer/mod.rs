//! Draw request generation
//!
//! Produces ordered draw requests; no pixels are rendered here.

pub mod draw_list;
pub mod overlay;

pub use draw_list::{BackgroundScroll, DrawCommand, DrawList};
pub use overlay::{LightMap, LightTile};
