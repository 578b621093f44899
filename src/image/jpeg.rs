//! JPEG handling: per the spec, only metadata is parsed (SOI, APPn, DQT,
//! SOF0 markers) to recover pixel dimensions and component count; the
//! entropy-coded payload is never decoded, and is passed through verbatim
//! as a PDF DCTDecode stream.

use crate::error::PagecraftError;
use crate::image::PassthroughJpeg;
use crate::primitives::ByteReader;

pub fn sniff(bytes: &[u8]) -> Result<PassthroughJpeg, PagecraftError> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return Err(PagecraftError::parse("not a JPEG file (missing SOI marker)"));
    }
    let mut r = ByteReader::new(&bytes[2..]);
    loop {
        let marker_prefix = match r.u8() {
            Ok(b) => b,
            Err(_) => return Err(PagecraftError::parse("JPEG ended before SOF marker")),
        };
        if marker_prefix != 0xFF {
            continue;
        }
        let marker = match r.u8() {
            Ok(b) => b,
            Err(_) => return Err(PagecraftError::parse("JPEG ended before SOF marker")),
        };
        match marker {
            0xD8 | 0x01 => continue,          // SOI / TEM, no payload
            0xD9 => return Err(PagecraftError::parse("JPEG ended before SOF marker (EOI)")),
            0xC0 | 0xC1 | 0xC2 | 0xC3 => {
                // SOF0 (baseline), SOF1, SOF2 (progressive), SOF3: dimensions
                // live at the same offsets in all of these.
                let _length = r.u16().map_err(|_| PagecraftError::parse("truncated SOF segment"))?;
                let _precision = r.u8().map_err(|_| PagecraftError::parse("truncated SOF segment"))?;
                let height = r.u16().map_err(|_| PagecraftError::parse("truncated SOF segment"))?;
                let width = r.u16().map_err(|_| PagecraftError::parse("truncated SOF segment"))?;
                let num_components = r.u8().map_err(|_| PagecraftError::parse("truncated SOF segment"))?;
                return Ok(PassthroughJpeg {
                    width: width as u32,
                    height: height as u32,
                    num_components,
                    data: bytes.to_vec(),
                });
            }
            0xD0..=0xD7 => continue, // RSTn: no length field
            _ => {
                let length = r.u16().map_err(|_| PagecraftError::parse("truncated JPEG segment"))?;
                if length < 2 {
                    return Err(PagecraftError::parse("invalid JPEG segment length"));
                }
                r.seek(r.position() + (length as usize - 2))
                    .map_err(|_| PagecraftError::parse("JPEG segment overruns buffer"))?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_soi() {
        let bytes = [0u8; 8];
        assert!(sniff(&bytes).is_err());
    }

    #[test]
    fn parses_minimal_sof0() {
        let mut bytes = vec![0xFF, 0xD8]; // SOI
        bytes.extend_from_slice(&[0xFF, 0xC0]); // SOF0
        bytes.extend_from_slice(&[0x00, 0x11]); // length = 17
        bytes.push(8); // precision
        bytes.extend_from_slice(&100u16.to_be_bytes()); // height
        bytes.extend_from_slice(&200u16.to_be_bytes()); // width
        bytes.push(3); // components
        bytes.extend_from_slice(&[0u8; 9]); // component specs (3 * 3 bytes)
        let info = sniff(&bytes).unwrap();
        assert_eq!(info.width, 200);
        assert_eq!(info.height, 100);
        assert_eq!(info.num_components, 3);
    }
}
