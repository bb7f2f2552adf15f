//! Truevision TGA decoding
//!
//! Supports uncompressed and run-length encoded color-mapped, true-color
//! and greyscale images. Decoded images expand lazily to top-left-origin
//! RGBA8, which is what the rasterizer samples from.

mod header;
mod rle;
mod tga;

pub use header::*;
pub use rle::decode as decode_rle;
pub use tga::*;

use thiserror::Error;

/// Error type for TGA decoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TgaError {
    /// Truncated buffer or inconsistent pixel data
    #[error("malformed image: {0}")]
    MalformedImage(String),
    /// Valid TGA, but a field combination this decoder does not handle
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}
