//! WebP decoding: only the VP8L (lossless) bitstream is supported, per the
//! spec; a `VP8X` extended-header chunk is accepted as long as it doesn't
//! carry the animation flag. Decoding itself is delegated to the `image`
//! crate's WebP decoder (its VP8L path), matching the project's general
//! preference for the ecosystem codec over a hand-rolled one.

use crate::error::PagecraftError;
use crate::image::DecodedImage;

const ANIMATION_FLAG: u8 = 0b0000_0010;

pub fn decode(bytes: &[u8]) -> Result<DecodedImage, PagecraftError> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WEBP" {
        return Err(PagecraftError::parse("not a WebP file (bad RIFF/WEBP header)"));
    }

    let mut offset = 12;
    while offset + 8 <= bytes.len() {
        let chunk_id = &bytes[offset..offset + 4];
        let chunk_len = u32::from_le_bytes([bytes[offset + 4], bytes[offset + 5], bytes[offset + 6], bytes[offset + 7]]) as usize;
        let data_start = offset + 8;
        match chunk_id {
            b"VP8X" => {
                if data_start < bytes.len() {
                    let flags = bytes[data_start];
                    if flags & ANIMATION_FLAG != 0 {
                        return Err(PagecraftError::parse("animated WebP is not supported"));
                    }
                }
            }
            b"VP8 " => {
                return Err(PagecraftError::parse("lossy WebP (VP8) is not supported, only VP8L"));
            }
            b"VP8L" => {
                let dynamic = image::load_from_memory_with_format(bytes, image::ImageFormat::WebP)
                    .map_err(|e| PagecraftError::parse(format!("WebP decode failed: {e}")))?;
                let rgba = dynamic.to_rgba8();
                let has_alpha = rgba.pixels().any(|p| p.0[3] != 255);
                return Ok(DecodedImage { width: rgba.width(), height: rgba.height(), rgba: rgba.into_raw(), has_alpha });
            }
            _ => {}
        }
        offset = data_start + chunk_len + (chunk_len % 2);
    }

    Err(PagecraftError::parse("WebP file has no VP8L chunk"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_webp_header() {
        let bytes = [0u8; 16];
        assert!(decode(&bytes).is_err());
    }
}
