//! Core types for the rasterizer

use serde::{Deserialize, Serialize};

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Multiply RGB by `intensity`, keeping alpha.
    ///
    /// The intensity is not clamped. Channels are truncated toward zero and
    /// saturate at 0 and 255, so a negative intensity gives black.
    pub fn shade(self, intensity: f32) -> Self {
        Self {
            r: (self.r as f32 * intensity) as u8,
            g: (self.g as f32 * intensity) as u8,
            b: (self.b as f32 * intensity) as u8,
            a: self.a,
        }
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::with_alpha(bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

/// RGBA8 bitmap with top-left origin, sampled nearest-neighbor
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
    pub name: String,
}

impl Texture {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::WHITE; width * height],
            name: String::new(),
        }
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 4) + (y / 4)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        Self { width, height, pixels, name: "checkerboard".to_string() }
    }

    /// Sample at texture coordinates, (0, 0) = top-left texel.
    /// Coordinates clamp to the edge texels, so u = 1 and v = 1 hit the
    /// last column and row; no filtering. An empty texture samples black.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        if self.width == 0 || self.height == 0 {
            return Color::BLACK;
        }
        let tx = ((u * self.width as f32) as usize).min(self.width - 1);
        let ty = ((v * self.height as f32) as usize).min(self.height - 1);
        self.get_pixel(tx, ty)
    }

    /// Get pixel at x,y coordinates
    pub fn get_pixel(&self, x: usize, y: usize) -> Color {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            Color::BLACK
        }
    }
}
