//! WOFF (version 1) container reconstruction: a fixed header followed by a
//! table directory whose entries are individually zlib-compressed. Simpler
//! than WOFF2 (no shared Brotli stream, no glyf/loca/hmtx transforms), so it
//! is handled separately and synchronously via `flate2` rather than routed
//! through the `Environment` Brotli backend.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::fonts::sfnt::SfntTables;
use crate::primitives::{ByteReader, ReadError};

#[derive(Debug)]
pub struct WoffError(pub String);

impl From<ReadError> for WoffError {
    fn from(e: ReadError) -> Self {
        WoffError(e.0.to_string())
    }
}

struct WoffHeader {
    flavor: u32,
    num_tables: u16,
}

struct WoffTableEntry {
    tag: [u8; 4],
    offset: u32,
    comp_length: u32,
    orig_length: u32,
}

pub fn inflate_to_sfnt(data: &[u8]) -> Result<Vec<u8>, WoffError> {
    let mut r = ByteReader::new(data);
    let signature = r.tag()?;
    if &signature != b"wOFF" {
        return Err(WoffError("not a WOFF file".to_string()));
    }
    let flavor = r.u32()?;
    let _length = r.u32()?;
    let num_tables = r.u16()?;
    let _reserved = r.u16()?;
    let _total_sfnt_size = r.u32()?;
    let _major = r.u16()?;
    let _minor = r.u16()?;
    let _meta_offset = r.u32()?;
    let _meta_length = r.u32()?;
    let _meta_orig_length = r.u32()?;
    let _priv_offset = r.u32()?;
    let _priv_length = r.u32()?;

    let header = WoffHeader { flavor, num_tables };

    let mut entries = Vec::with_capacity(header.num_tables as usize);
    for _ in 0..header.num_tables {
        let tag = r.tag()?;
        let offset = r.u32()?;
        let comp_length = r.u32()?;
        let orig_length = r.u32()?;
        let _orig_checksum = r.u32()?;
        entries.push(WoffTableEntry { tag, offset, comp_length, orig_length });
    }

    let mut tables = std::collections::BTreeMap::new();
    for entry in &entries {
        let start = entry.offset as usize;
        let end = start + entry.comp_length as usize;
        if end > data.len() {
            return Err(WoffError(format!("table {} out of bounds", String::from_utf8_lossy(&entry.tag))));
        }
        let raw = &data[start..end];
        let bytes = if entry.comp_length == entry.orig_length {
            raw.to_vec()
        } else {
            let mut decoder = ZlibDecoder::new(raw);
            let mut out = Vec::with_capacity(entry.orig_length as usize);
            decoder
                .read_to_end(&mut out)
                .map_err(|e| WoffError(format!("zlib inflate failed for {}: {e}", String::from_utf8_lossy(&entry.tag))))?;
            out
        };
        tables.insert(entry.tag, bytes);
    }

    let sfnt = SfntTables { sfnt_version: header.flavor, tables };
    Ok(sfnt.serialize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_woff_signature() {
        let data = [0u8; 16];
        let err = inflate_to_sfnt(&data).unwrap_err();
        assert!(err.0.contains("not a WOFF"));
    }
}
