//! TGA run-length packets
//!
//! Each packet starts with a control byte. Bits 0-6 hold the pixel count
//! minus one. With bit 7 set, one pixel follows and is repeated; with it
//! clear, that many literal pixels follow.

use super::TgaError;

const RUN_FLAG: u8 = 0b1000_0000;
const COUNT_MASK: u8 = 0b0111_1111;

/// Expand RLE packets from `data` into exactly `output_size` bytes.
///
/// Returns the decoded bytes and the number of input bytes consumed. Input
/// that ends early, or a packet that would overshoot `output_size`, is
/// malformed.
pub fn decode(data: &[u8], pixel_size: usize, output_size: usize) -> Result<(Vec<u8>, usize), TgaError> {
    let mut output = Vec::with_capacity(output_size);
    let mut offset = 0;

    while output.len() < output_size {
        let flag = *data.get(offset).ok_or_else(|| {
            TgaError::MalformedImage(format!(
                "RLE data ended after {} of {} bytes",
                output.len(),
                output_size
            ))
        })?;
        offset += 1;

        let count = (flag & COUNT_MASK) as usize + 1;
        let packet_bytes = count * pixel_size;
        if output.len() + packet_bytes > output_size {
            return Err(TgaError::MalformedImage(format!(
                "RLE packet of {} pixels overruns the {}-byte image",
                count, output_size
            )));
        }

        let read = if flag & RUN_FLAG != 0 { pixel_size } else { packet_bytes };
        let src = data.get(offset..offset + read).ok_or_else(|| {
            TgaError::MalformedImage(format!("RLE packet at byte {} is truncated", offset - 1))
        })?;
        offset += read;

        if flag & RUN_FLAG != 0 {
            for _ in 0..count {
                output.extend_from_slice(src);
            }
        } else {
            output.extend_from_slice(src);
        }
    }

    Ok((output, offset))
}
