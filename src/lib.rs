//! tinyrender: a small software rasterizer
//!
//! Turns meshes into an RGBA pixel buffer entirely on the CPU:
//! - Bresenham lines and barycentric triangles with a z-buffer
//! - Homogeneous transforms with perspective divide
//! - Flat shading and nearest-neighbor texturing
//! - A TGA decoder for texture input
//!
//! The host owns presentation; the renderer only fills memory.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod codec;
pub mod config;
pub mod mesh;
pub mod rasterizer;
