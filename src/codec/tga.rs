//! Decoded TGA image and its RGBA expansion

use std::sync::OnceLock;

use super::header::{TgaHeader, HEADER_SIZE};
use super::rle;
use super::TgaError;
use crate::rasterizer::{Color, Texture};

/// Bytes per color map entry (24-bit B,G,R)
const PALETTE_ENTRY_SIZE: usize = 3;

/// A decoded TGA: header, optional palette and the pixel payload in file
/// order. The RGBA8 expansion is built on first use and cached.
#[derive(Debug)]
pub struct TgaImage {
    header: TgaHeader,
    palette: Option<Vec<u8>>,
    pixel_data: Vec<u8>,
    rgba: OnceLock<Vec<u8>>,
}

fn take<'a>(bytes: &'a [u8], offset: usize, len: usize, what: &str) -> Result<&'a [u8], TgaError> {
    bytes.get(offset..offset + len).ok_or_else(|| {
        TgaError::MalformedImage(format!(
            "{} needs {} bytes at offset {}, file has {}",
            what,
            len,
            offset,
            bytes.len()
        ))
    })
}

impl TgaImage {
    /// Decode a complete TGA file held in memory
    pub fn decode(bytes: &[u8]) -> Result<Self, TgaError> {
        let header = TgaHeader::parse(bytes)?;
        log::debug!(
            "TGA header: type {:?}, {}x{} @ {} bpp, descriptor {:#04x}",
            header.image_type,
            header.width,
            header.height,
            header.pixel_depth,
            header.descriptor
        );

        let mut offset = HEADER_SIZE + header.id_length as usize;

        let palette = if header.image_type.has_color_map() {
            let size = header.color_map_size();
            let table = take(bytes, offset, size, "color map")?.to_vec();
            offset += size;
            Some(table)
        } else {
            None
        };

        let pixel_size = header.bytes_per_pixel();
        let output_size = header.pixel_count() * pixel_size;

        let pixel_data = if header.image_type.is_rle() {
            let (data, used) = rle::decode(&bytes[offset.min(bytes.len())..], pixel_size, output_size)?;
            log::trace!("RLE: {} packet bytes -> {} pixel bytes", used, data.len());
            data
        } else {
            take(bytes, offset, output_size, "pixel data")?.to_vec()
        };

        let image = Self {
            header,
            palette,
            pixel_data,
            rgba: OnceLock::new(),
        };
        image.check_palette_indices()?;
        Ok(image)
    }

    /// Every index must land inside the table, so expansion cannot fail
    fn check_palette_indices(&self) -> Result<(), TgaError> {
        let Some(palette) = &self.palette else {
            return Ok(());
        };
        let start = self.header.color_map_start as usize;
        let entries = palette.len() / PALETTE_ENTRY_SIZE;
        for (i, &index) in self.pixel_data.iter().enumerate() {
            let index = index as usize;
            if index < start || index - start >= entries {
                return Err(TgaError::MalformedImage(format!(
                    "pixel {} uses color index {}, map covers {}..{}",
                    i,
                    index,
                    start,
                    start + entries
                )));
            }
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.header.width as usize
    }

    pub fn height(&self) -> usize {
        self.header.height as usize
    }

    pub fn header(&self) -> &TgaHeader {
        &self.header
    }

    /// Raw color map bytes in B,G,R order
    pub fn palette(&self) -> Option<&[u8]> {
        self.palette.as_deref()
    }

    /// Pixel bytes in file order, already RLE-expanded
    pub fn pixel_data(&self) -> &[u8] {
        &self.pixel_data
    }

    /// Top-left-origin RGBA8, `width * height * 4` bytes. Computed once.
    pub fn to_rgba(&self) -> &[u8] {
        self.rgba.get_or_init(|| self.expand())
    }

    /// Copy the RGBA expansion into a texture for the rasterizer
    pub fn to_texture(&self, name: impl Into<String>) -> Texture {
        let pixels = self
            .to_rgba()
            .chunks_exact(4)
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]))
            .collect();
        Texture {
            width: self.width(),
            height: self.height(),
            pixels,
            name: name.into(),
        }
    }

    fn expand(&self) -> Vec<u8> {
        let (w, h) = (self.width(), self.height());
        let bpp = self.header.bytes_per_pixel();
        let top = self.header.is_top_origin();
        let right = self.header.is_right_origin();

        let mut out = Vec::with_capacity(w * h * 4);
        for y in 0..h {
            let sy = if top { y } else { h - 1 - y };
            for x in 0..w {
                let sx = if right { w - 1 - x } else { x };
                let at = (sy * w + sx) * bpp;
                out.extend_from_slice(&self.expand_pixel(&self.pixel_data[at..at + bpp]));
            }
        }
        out
    }

    fn expand_pixel(&self, px: &[u8]) -> [u8; 4] {
        let grey = self.header.image_type.is_grey();
        match (px.len(), grey) {
            (1, true) => [px[0], px[0], px[0], 255],
            (1, false) => {
                let index = px[0] as usize - self.header.color_map_start as usize;
                let entry = index * PALETTE_ENTRY_SIZE;
                match self.palette.as_deref().and_then(|p| p.get(entry..entry + PALETTE_ENTRY_SIZE)) {
                    Some(bgr) => [bgr[2], bgr[1], bgr[0], 255],
                    None => [0, 0, 0, 255],
                }
            }
            (2, true) => [px[0], px[0], px[0], px[1]],
            (2, false) => unpack_555(u16::from_le_bytes([px[0], px[1]]), self.header.alpha_bits() > 0),
            (3, _) => [px[2], px[1], px[0], 255],
            (_, _) => [px[2], px[1], px[0], px[3]],
        }
    }
}

/// A-R5-G5-B5 word, 5-bit channels widened to 8 bits
fn unpack_555(word: u16, has_alpha: bool) -> [u8; 4] {
    let widen = |v: u16| {
        let v = (v & 0x1f) as u8;
        (v << 3) | (v >> 2)
    };
    let a = if !has_alpha || word & 0x8000 != 0 { 255 } else { 0 };
    [widen(word >> 10), widen(word >> 5), widen(word), a]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ImageType, ORIGIN_RIGHT, ORIGIN_TOP};

    fn tga(image_type: u8, depth: u8, width: u16, height: u16, descriptor: u8, body: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[0x02] = image_type;
        bytes[0x0c..0x0e].copy_from_slice(&width.to_le_bytes());
        bytes[0x0e..0x10].copy_from_slice(&height.to_le_bytes());
        bytes[0x10] = depth;
        bytes[0x11] = descriptor;
        bytes.extend_from_slice(body);
        bytes
    }

    fn indexed(rle: bool, start: u16, palette: &[[u8; 3]], body: &[u8], width: u16, height: u16) -> Vec<u8> {
        let mut bytes = tga(if rle { 9 } else { 1 }, 8, width, height, ORIGIN_TOP, &[]);
        bytes[0x01] = 1;
        bytes[0x03..0x05].copy_from_slice(&start.to_le_bytes());
        bytes[0x05..0x07].copy_from_slice(&(palette.len() as u16).to_le_bytes());
        bytes[0x07] = 24;
        for entry in palette {
            bytes.extend_from_slice(entry);
        }
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn test_rle_grey_matches_raw() {
        let rle = TgaImage::decode(&tga(11, 8, 2, 1, 0, &[0x80, 10])).unwrap();
        let raw = TgaImage::decode(&tga(3, 8, 2, 1, 0, &[10, 10])).unwrap();
        assert_eq!(rle.pixel_data(), &[10, 10]);
        assert_eq!(rle.pixel_data(), raw.pixel_data());
        assert_eq!(rle.to_rgba(), raw.to_rgba());
        assert_eq!(rle.to_rgba(), &[10, 10, 10, 255, 10, 10, 10, 255]);
    }

    #[test]
    fn test_skips_id_field() {
        let mut bytes = tga(3, 8, 1, 1, 0, &[1, 2, 3, 77]);
        bytes[0x00] = 3;
        let img = TgaImage::decode(&bytes).unwrap();
        assert_eq!(img.pixel_data(), &[77]);
    }

    #[test]
    fn test_truncated_pixel_data() {
        let bytes = tga(2, 24, 2, 2, 0, &[0; 11]);
        assert!(matches!(TgaImage::decode(&bytes), Err(TgaError::MalformedImage(_))));
    }

    #[test]
    fn test_truncated_palette() {
        let mut bytes = indexed(false, 0, &[[1, 2, 3], [4, 5, 6]], &[], 1, 1);
        bytes.truncate(HEADER_SIZE + 4);
        assert!(matches!(TgaImage::decode(&bytes), Err(TgaError::MalformedImage(_))));
    }

    #[test]
    fn test_rle_underflow_and_overflow() {
        // Image needs 3 bytes; the stream makes 2
        let short = tga(11, 8, 3, 1, 0, &[0x81, 5]);
        assert!(matches!(TgaImage::decode(&short), Err(TgaError::MalformedImage(_))));
        // Run of 4 into a 3-byte image
        let long = tga(11, 8, 3, 1, 0, &[0x83, 5]);
        assert!(matches!(TgaImage::decode(&long), Err(TgaError::MalformedImage(_))));
    }

    #[test]
    fn test_unsupported_depth() {
        let bytes = tga(2, 12, 1, 1, 0, &[0; 4]);
        assert!(matches!(TgaImage::decode(&bytes), Err(TgaError::UnsupportedFormat(_))));
        assert!(matches!(TgaImage::decode(&bytes[..10]), Err(TgaError::MalformedImage(_))));
    }

    #[test]
    fn test_palette_bgr_order() {
        let bytes = indexed(false, 0, &[[0x10, 0x20, 0x30], [1, 2, 3]], &[1, 0], 2, 1);
        let img = TgaImage::decode(&bytes).unwrap();
        assert_eq!(img.header().image_type, ImageType::Indexed);
        assert_eq!(img.palette().map(|p| p.len()), Some(6));
        assert_eq!(img.to_rgba(), &[3, 2, 1, 255, 0x30, 0x20, 0x10, 255]);
    }

    #[test]
    fn test_palette_start_offset() {
        let bytes = indexed(false, 4, &[[9, 9, 9], [0, 0, 200]], &[5], 1, 1);
        let img = TgaImage::decode(&bytes).unwrap();
        assert_eq!(img.to_rgba(), &[200, 0, 0, 255]);
    }

    #[test]
    fn test_palette_index_out_of_range() {
        let bytes = indexed(false, 0, &[[1, 2, 3]], &[1], 1, 1);
        assert!(matches!(TgaImage::decode(&bytes), Err(TgaError::MalformedImage(_))));
        let below = indexed(false, 2, &[[1, 2, 3]], &[1], 1, 1);
        assert!(matches!(TgaImage::decode(&below), Err(TgaError::MalformedImage(_))));
    }

    #[test]
    fn test_rle_indexed() {
        let bytes = indexed(true, 0, &[[0, 0, 255], [255, 0, 0]], &[0x81, 1, 0x00, 0], 3, 1);
        let img = TgaImage::decode(&bytes).unwrap();
        assert_eq!(img.pixel_data(), &[1, 1, 0]);
        assert_eq!(&img.to_rgba()[..4], &[0, 0, 255, 255]);
        assert_eq!(&img.to_rgba()[8..], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_bottom_left_origin_flips_rows() {
        // File rows: bottom row first
        let img = TgaImage::decode(&tga(3, 8, 1, 2, 0, &[1, 2])).unwrap();
        assert_eq!(img.to_rgba(), &[2, 2, 2, 255, 1, 1, 1, 255]);
    }

    #[test]
    fn test_right_origin_flips_columns() {
        let img = TgaImage::decode(&tga(3, 8, 2, 1, ORIGIN_TOP | ORIGIN_RIGHT, &[1, 2])).unwrap();
        assert_eq!(img.to_rgba(), &[2, 2, 2, 255, 1, 1, 1, 255]);
    }

    #[test]
    fn test_grey_16() {
        let img = TgaImage::decode(&tga(3, 16, 1, 1, ORIGIN_TOP, &[90, 128])).unwrap();
        assert_eq!(img.to_rgba(), &[90, 90, 90, 128]);
    }

    #[test]
    fn test_color_16_unpacking() {
        // R = 31, G = 0, B = 16, alpha bit set
        let word: u16 = 0x8000 | (31 << 10) | 16;
        let bytes = tga(2, 16, 1, 1, ORIGIN_TOP | 1, &word.to_le_bytes());
        let img = TgaImage::decode(&bytes).unwrap();
        assert_eq!(img.to_rgba(), &[255, 0, 132, 255]);

        // Alpha bit clear counts only when the descriptor declares alpha
        let word: u16 = 31 << 5;
        let with_alpha = TgaImage::decode(&tga(2, 16, 1, 1, ORIGIN_TOP | 1, &word.to_le_bytes())).unwrap();
        assert_eq!(with_alpha.to_rgba(), &[0, 255, 0, 0]);
        let opaque = TgaImage::decode(&tga(2, 16, 1, 1, ORIGIN_TOP, &word.to_le_bytes())).unwrap();
        assert_eq!(opaque.to_rgba(), &[0, 255, 0, 255]);
    }

    #[test]
    fn test_color_24_and_32() {
        let img = TgaImage::decode(&tga(2, 24, 1, 1, ORIGIN_TOP, &[1, 2, 3])).unwrap();
        assert_eq!(img.to_rgba(), &[3, 2, 1, 255]);
        let img = TgaImage::decode(&tga(2, 32, 1, 1, ORIGIN_TOP | 8, &[1, 2, 3, 4])).unwrap();
        assert_eq!(img.to_rgba(), &[3, 2, 1, 4]);
    }

    #[test]
    fn test_rle_rgb_32() {
        let body = [0x81, 10, 20, 30, 40];
        let img = TgaImage::decode(&tga(10, 32, 2, 1, ORIGIN_TOP, &body)).unwrap();
        assert_eq!(img.to_rgba(), &[30, 20, 10, 40, 30, 20, 10, 40]);
    }

    #[test]
    fn test_rgba_is_memoized() {
        let img = TgaImage::decode(&tga(2, 24, 2, 2, 0, &[7; 12])).unwrap();
        let first = img.to_rgba().as_ptr();
        let second = img.to_rgba().as_ptr();
        assert_eq!(first, second);
        assert_eq!(img.to_rgba().len(), 16);
    }

    #[test]
    fn test_to_texture() {
        let img = TgaImage::decode(&tga(2, 24, 2, 1, ORIGIN_TOP, &[0, 0, 255, 255, 0, 0])).unwrap();
        let tex = img.to_texture("swatch");
        assert_eq!((tex.width, tex.height), (2, 1));
        assert_eq!(tex.name, "swatch");
        assert_eq!(tex.get_pixel(0, 0), Color::RED);
        assert_eq!(tex.get_pixel(1, 0), Color::BLUE);
    }
}
