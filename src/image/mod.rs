//! Image codecs: decode PNG/WebP-lossless to RGBA8 for PDF XObject
//! embedding, and sniff JPEG headers for metadata-only pass-through as
//! DCTDecode. Grounded on the teacher's `layout.rs::resolve_img_auto_dimensions`
//! (which already calls into the `image` crate for intrinsic sizing) —
//! generalized into a standalone module so the painter and layout engine
//! share one decode path instead of duplicating `image::load_from_memory`
//! call sites.

pub mod jpeg;
pub mod png;
pub mod webp;

use crate::error::PagecraftError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

/// A fully decoded raster image ready for PDF `/Image` XObject embedding.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub has_alpha: bool,
}

/// A JPEG whose payload is passed through untouched (DCTDecode); only
/// enough header structure is parsed to recover the pixel dimensions and
/// color component count the PDF `/Image` dictionary needs.
pub struct PassthroughJpeg {
    pub width: u32,
    pub height: u32,
    pub num_components: u8,
    pub data: Vec<u8>,
}

pub enum Image {
    Raster(DecodedImage),
    Jpeg(PassthroughJpeg),
}

impl Image {
    pub fn width(&self) -> u32 {
        match self {
            Image::Raster(d) => d.width,
            Image::Jpeg(j) => j.width,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Image::Raster(d) => d.height,
            Image::Jpeg(j) => j.height,
        }
    }
}

/// Sniffs `bytes`' magic header and decodes via the matching codec.
pub fn decode(bytes: &[u8]) -> Result<Image, PagecraftError> {
    match sniff_format(bytes) {
        Some(ImageFormat::Png) => png::decode(bytes).map(Image::Raster),
        Some(ImageFormat::Jpeg) => jpeg::sniff(bytes).map(Image::Jpeg),
        Some(ImageFormat::Webp) => webp::decode(bytes).map(Image::Raster),
        None => Err(PagecraftError::parse("unrecognized image format (not PNG/JPEG/WebP)")),
    }
}

pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    if bytes.len() >= 8 && bytes[0..8] == PNG_SIGNATURE {
        return Some(ImageFormat::Png);
    }
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xD8 {
        return Some(ImageFormat::Jpeg);
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some(ImageFormat::Webp);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_png_signature() {
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0; 10]);
        assert_eq!(sniff_format(&bytes), Some(ImageFormat::Png));
    }

    #[test]
    fn sniffs_jpeg_soi() {
        let bytes = [0xFF, 0xD8, 0xFF, 0xE0];
        assert_eq!(sniff_format(&bytes), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn unrecognized_bytes_decode_to_error() {
        let bytes = [0u8; 16];
        assert!(decode(&bytes).is_err());
    }
}
