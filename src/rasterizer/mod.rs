//! Software rasterizer
//!
//! Features:
//! - Bresenham lines for wireframes and overlays
//! - Barycentric triangle fill with a z-buffer (greater depth wins)
//! - Nearest-neighbor texturing with per-face light intensity
//! - Homogeneous transforms with perspective divide

mod framebuffer;
mod line;
mod math;
mod render;
mod triangle;
mod types;

pub use framebuffer::*;
pub use line::*;
pub use math::*;
pub use render::*;
pub use triangle::*;
pub use types::*;
