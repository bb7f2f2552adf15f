//! Pixel and depth storage for software rendering

use std::path::Path;

use thiserror::Error;

use super::types::Color;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("surface must be at least 1x1, got {width}x{height}")]
    ZeroSized { width: usize, height: usize },
}

/// RGBA8 pixel buffer, row-major with the origin at the top-left
pub struct PixelSurface {
    pixels: Vec<u8>, // RGBA, 4 bytes per pixel
    width: usize,
    height: usize,
}

impl PixelSurface {
    /// New surface filled with opaque black
    pub fn new(width: usize, height: usize) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::ZeroSized { width, height });
        }
        let mut surface = Self {
            pixels: vec![0; width * height * 4],
            width,
            height,
        };
        surface.clear(Color::BLACK);
        Ok(surface)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    /// Write one pixel. Coordinates outside the surface are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            let idx = (y as usize * self.width + x as usize) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&color.to_bytes());
        }
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Color> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            let idx = (y as usize * self.width + x as usize) * 4;
            Some(Color::from_bytes([
                self.pixels[idx],
                self.pixels[idx + 1],
                self.pixels[idx + 2],
                self.pixels[idx + 3],
            ]))
        } else {
            None
        }
    }

    /// Borrow the current contents for presentation
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            width: self.width,
            height: self.height,
            pixels: &self.pixels,
        }
    }
}

/// Per-pixel depth, one `f32` per surface pixel, starting at -infinity.
///
/// Within a render pass a cell only ever grows: it is overwritten only by a
/// strictly greater depth.
pub struct DepthBuffer {
    depth: Vec<f32>,
    width: usize,
    height: usize,
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::ZeroSized { width, height });
        }
        Ok(Self {
            depth: vec![f32::NEG_INFINITY; width * height],
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reset every cell to -infinity for a new render pass
    pub fn clear(&mut self) {
        self.depth.fill(f32::NEG_INFINITY);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.depth[y * self.width + x])
        } else {
            None
        }
    }

    /// Store `z` if it is strictly greater than the current depth.
    /// Returns whether the test passed. NaN never passes.
    pub fn test_and_set(&mut self, x: usize, y: usize, z: f32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let cell = &mut self.depth[y * self.width + x];
        if z > *cell {
            *cell = z;
            true
        } else {
            false
        }
    }
}

/// Read-only view of a surface handed to the host for display
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub width: usize,
    pub height: usize,
    pub pixels: &'a [u8],
}

impl Snapshot<'_> {
    /// Encode the snapshot as a PNG file
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> image::ImageResult<()> {
        image::save_buffer_with_format(
            path,
            self.pixels,
            self.width as u32,
            self.height as u32,
            image::ExtendedColorType::Rgba8,
            image::ImageFormat::Png,
        )
    }
}
