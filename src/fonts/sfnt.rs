//! SFNT container read/write: the offset table and table directory shared by
//! TTF and OTF, used both to reconstruct WOFF/WOFF2 streams and to reassemble
//! a subsetted font for embedding. Table *content* parsing (cmap, hmtx, …)
//! is left to `ttf-parser`; this module only understands the container.

use std::collections::BTreeMap;

use crate::primitives::{ByteReader, ReadError};

pub const SFNT_VERSION_TRUETYPE: u32 = 0x0001_0000;
pub const SFNT_VERSION_OTTO: u32 = 0x4F54_544F;

#[derive(Debug)]
pub struct SfntError(pub String);

impl From<ReadError> for SfntError {
    fn from(e: ReadError) -> Self {
        SfntError(e.0.to_string())
    }
}

/// One table directory entry as read from (or to be written to) an SFNT
/// header: tag, checksum, byte offset, and length.
#[derive(Debug, Clone)]
pub struct TableEntry {
    pub tag: [u8; 4],
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// A font container reduced to its raw table bytes, keyed by tag. Ordered
/// (`BTreeMap`) so reassembly can emit directory entries sorted by tag, as
/// the spec requires.
pub struct SfntTables {
    pub sfnt_version: u32,
    pub tables: BTreeMap<[u8; 4], Vec<u8>>,
}

impl SfntTables {
    pub fn parse(data: &[u8]) -> Result<Self, SfntError> {
        let mut r = ByteReader::new(data);
        let sfnt_version = r.u32()?;
        let num_tables = r.u16()?;
        let _search_range = r.u16()?;
        let _entry_selector = r.u16()?;
        let _range_shift = r.u16()?;

        let mut tables = BTreeMap::new();
        for _ in 0..num_tables {
            let tag = r.tag()?;
            let _checksum = r.u32()?;
            let offset = r.u32()? as usize;
            let length = r.u32()? as usize;
            if offset + length > data.len() {
                return Err(SfntError(format!(
                    "table {} extends past end of file",
                    String::from_utf8_lossy(&tag)
                )));
            }
            tables.insert(tag, data[offset..offset + length].to_vec());
        }
        Ok(Self { sfnt_version, tables })
    }

    pub fn get(&self, tag: &[u8; 4]) -> Option<&[u8]> {
        self.tables.get(tag).map(|v| v.as_slice())
    }

    pub fn insert(&mut self, tag: [u8; 4], data: Vec<u8>) {
        self.tables.insert(tag, data);
    }

    /// Reassembles the table set into a single SFNT byte stream: directory
    /// sorted by tag, table data padded to 4-byte boundaries, per-table
    /// checksums recomputed, and `head.checkSumAdjustment` fixed up to make
    /// the whole-file checksum (mod 2^32) equal `0xB1B0AFBA`.
    pub fn serialize(&self) -> Vec<u8> {
        let num_tables = self.tables.len() as u16;
        let entry_selector = (num_tables.max(1) as f32).log2().floor() as u16;
        let search_range = (1u16 << entry_selector).saturating_mul(16);
        let range_shift = num_tables.saturating_mul(16).saturating_sub(search_range);

        let header_len = 12 + 16 * self.tables.len();
        let mut body_offset = header_len;
        let mut padded: Vec<(&[u8; 4], &[u8], u32)> = Vec::new();
        for (tag, data) in &self.tables {
            let checksum = table_checksum(data);
            padded.push((tag, data, checksum));
        }

        let mut out = Vec::with_capacity(header_len + self.tables.values().map(|v| v.len() + 3).sum::<usize>());
        out.extend_from_slice(&self.sfnt_version.to_be_bytes());
        out.extend_from_slice(&num_tables.to_be_bytes());
        out.extend_from_slice(&search_range.to_be_bytes());
        out.extend_from_slice(&entry_selector.to_be_bytes());
        out.extend_from_slice(&range_shift.to_be_bytes());

        let mut offsets = Vec::new();
        for (_, data, _) in &padded {
            offsets.push(body_offset as u32);
            body_offset += data.len();
            body_offset = (body_offset + 3) & !3;
        }

        for ((tag, data, checksum), offset) in padded.iter().zip(&offsets) {
            out.extend_from_slice(tag.as_slice());
            out.extend_from_slice(&checksum.to_be_bytes());
            out.extend_from_slice(&offset.to_be_bytes());
            out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        }

        for (_, data, _) in &padded {
            out.extend_from_slice(data);
            while out.len() % 4 != 0 {
                out.push(0);
            }
        }

        fix_checksum_adjustment(&mut out, &self.tables, header_len, &offsets);
        out
    }
}

/// Sums a table's bytes as big-endian u32 words, padding the final partial
/// word with zero bytes, per the OpenType checksum algorithm.
pub fn table_checksum(data: &[u8]) -> u32 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        sum = sum.wrapping_add(u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    let rem = chunks.remainder();
    if !rem.is_empty() {
        let mut buf = [0u8; 4];
        buf[..rem.len()].copy_from_slice(rem);
        sum = sum.wrapping_add(u32::from_be_bytes(buf));
    }
    sum
}

fn fix_checksum_adjustment(
    out: &mut [u8],
    tables: &BTreeMap<[u8; 4], Vec<u8>>,
    header_len: usize,
    offsets: &[u32],
) {
    let head_tag = *b"head";
    let Some(head_index) = tables.keys().position(|t| *t == head_tag) else {
        return;
    };
    let head_offset = offsets[head_index] as usize;
    if head_offset + 12 > out.len() {
        return;
    }
    // checkSumAdjustment lives at byte offset 8 within `head`.
    out[head_offset + 8..head_offset + 12].copy_from_slice(&0u32.to_be_bytes());
    let whole_file_checksum = table_checksum(out);
    let adjustment = 0xB1B0_AFBAu32.wrapping_sub(whole_file_checksum);
    out[head_offset + 8..head_offset + 12].copy_from_slice(&adjustment.to_be_bytes());
    let _ = header_len;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_of_empty_slice_is_zero() {
        assert_eq!(table_checksum(&[]), 0);
    }

    #[test]
    fn checksum_pads_partial_word() {
        let a = table_checksum(&[0, 0, 0, 1]);
        let b = table_checksum(&[0, 0, 0, 1, 0]);
        assert_eq!(a, b);
    }

    #[test]
    fn reassembled_directory_is_sorted_by_tag() {
        let mut tables = SfntTables { sfnt_version: SFNT_VERSION_TRUETYPE, tables: BTreeMap::new() };
        tables.insert(*b"glyf", vec![0u8; 4]);
        tables.insert(*b"cmap", vec![0u8; 4]);
        tables.insert(*b"head", {
            let mut h = vec![0u8; 54];
            h[0..4].copy_from_slice(&0x00010000u32.to_be_bytes());
            h
        });
        let bytes = tables.serialize();
        let reparsed = SfntTables::parse(&bytes).unwrap();
        let tags: Vec<_> = reparsed.tables.keys().collect();
        assert_eq!(tags, vec![b"cmap", b"glyf", b"head"]);
    }
}
