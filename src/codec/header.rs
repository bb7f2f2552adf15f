//! The fixed 18-byte TGA header

use super::TgaError;

/// Size of the fixed header in bytes
pub const HEADER_SIZE: usize = 0x12;

/// Descriptor bit: first row is the top row
pub const ORIGIN_TOP: u8 = 0b0010_0000;
/// Descriptor bit: first column is the rightmost column
pub const ORIGIN_RIGHT: u8 = 0b0001_0000;
/// Descriptor bits 0-3: number of attribute (alpha) bits per pixel
pub const ALPHA_BITS_MASK: u8 = 0b0000_1111;

/// Image type code at offset 0x02
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    NoData,
    Indexed,
    Rgb,
    Grey,
    RleIndexed,
    RleRgb,
    RleGrey,
}

impl ImageType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::NoData),
            1 => Some(Self::Indexed),
            2 => Some(Self::Rgb),
            3 => Some(Self::Grey),
            9 => Some(Self::RleIndexed),
            10 => Some(Self::RleRgb),
            11 => Some(Self::RleGrey),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::NoData => 0,
            Self::Indexed => 1,
            Self::Rgb => 2,
            Self::Grey => 3,
            Self::RleIndexed => 9,
            Self::RleRgb => 10,
            Self::RleGrey => 11,
        }
    }

    pub fn is_rle(self) -> bool {
        matches!(self, Self::RleIndexed | Self::RleRgb | Self::RleGrey)
    }

    pub fn has_color_map(self) -> bool {
        matches!(self, Self::Indexed | Self::RleIndexed)
    }

    pub fn is_grey(self) -> bool {
        matches!(self, Self::Grey | Self::RleGrey)
    }
}

/// TGA file header. Multi-byte fields are little-endian on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TgaHeader {
    pub id_length: u8,
    pub color_map_type: u8,
    pub image_type: ImageType,
    /// Index of the first color map entry
    pub color_map_start: u16,
    pub color_map_length: u16,
    /// Bits per color map entry
    pub color_map_entry_size: u8,
    pub x_origin: u16,
    pub y_origin: u16,
    pub width: u16,
    pub height: u16,
    /// Bits per pixel
    pub pixel_depth: u8,
    pub descriptor: u8,
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

impl TgaHeader {
    /// Read and validate the header at the start of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self, TgaError> {
        if bytes.len() < HEADER_SIZE {
            return Err(TgaError::MalformedImage(format!(
                "{} bytes is not enough for the {}-byte header",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let code = bytes[0x02];
        let image_type = ImageType::from_code(code)
            .ok_or_else(|| TgaError::UnsupportedFormat(format!("unknown image type {}", code)))?;

        let header = Self {
            id_length: bytes[0x00],
            color_map_type: bytes[0x01],
            image_type,
            color_map_start: read_u16(bytes, 0x03),
            color_map_length: read_u16(bytes, 0x05),
            color_map_entry_size: bytes[0x07],
            x_origin: read_u16(bytes, 0x08),
            y_origin: read_u16(bytes, 0x0a),
            width: read_u16(bytes, 0x0c),
            height: read_u16(bytes, 0x0e),
            pixel_depth: bytes[0x10],
            descriptor: bytes[0x11],
        };
        header.validate()?;
        Ok(header)
    }

    fn validate(&self) -> Result<(), TgaError> {
        let unsupported = |msg: String| Err(TgaError::UnsupportedFormat(msg));

        if self.image_type == ImageType::NoData {
            return unsupported("image contains no data".to_string());
        }

        if self.image_type.has_color_map() {
            if self.color_map_length > 256
                || self.color_map_entry_size != 24
                || self.color_map_type != 1
            {
                return unsupported(format!(
                    "color map of {} entries x {} bits (type {}); need <= 256 x 24 bits (type 1)",
                    self.color_map_length, self.color_map_entry_size, self.color_map_type
                ));
            }
        } else if self.color_map_type != 0 {
            return unsupported(format!(
                "color map type {} on an image without a color map",
                self.color_map_type
            ));
        }

        if self.width == 0 || self.height == 0 {
            return unsupported(format!("image size {}x{}", self.width, self.height));
        }

        if !matches!(self.pixel_depth, 8 | 16 | 24 | 32) {
            return unsupported(format!("pixel depth {}", self.pixel_depth));
        }

        // Depths that have no meaning for the image type
        let depth_ok = if self.image_type.has_color_map() {
            self.pixel_depth == 8
        } else if self.image_type.is_grey() {
            matches!(self.pixel_depth, 8 | 16)
        } else {
            self.pixel_depth != 8
        };
        if !depth_ok {
            return unsupported(format!(
                "pixel depth {} for image type {}",
                self.pixel_depth,
                self.image_type.code()
            ));
        }

        Ok(())
    }

    pub fn bytes_per_pixel(&self) -> usize {
        (self.pixel_depth >> 3) as usize
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size of the color map table in bytes (0 without a color map)
    pub fn color_map_size(&self) -> usize {
        if self.image_type.has_color_map() {
            self.color_map_length as usize * (self.color_map_entry_size >> 3) as usize
        } else {
            0
        }
    }

    pub fn is_top_origin(&self) -> bool {
        self.descriptor & ORIGIN_TOP != 0
    }

    pub fn is_right_origin(&self) -> bool {
        self.descriptor & ORIGIN_RIGHT != 0
    }

    pub fn alpha_bits(&self) -> u8 {
        self.descriptor & ALPHA_BITS_MASK
    }
}
