//! Font subsetting: given the set of glyph IDs a render actually painted,
//! emit a trimmed font program containing glyph 0, every used glyph and its
//! composite dependencies, an identity CID-to-GID map, and a ToUnicode CMap
//! mapping subset codes back to source codepoints.

use std::collections::{BTreeMap, BTreeSet};

use crate::fonts::sfnt::SfntTables;

#[derive(Debug)]
pub struct SubsetError(pub String);

/// The result of subsetting: the reassembled font program plus the
/// ToUnicode mapping the PDF emitter needs to build the `/ToUnicode` CMap
/// stream (gid -> originating codepoint).
pub struct FontSubset {
    pub program: Vec<u8>,
    pub gid_to_unicode: BTreeMap<u16, char>,
    pub num_glyphs: u16,
}

/// Walks a glyph's composite-component dependency chain (if any) and adds
/// every transitively-referenced glyph ID to `used`.
pub fn walk_composite_closure(face: &ttf_parser::Face, gid: u16, used: &mut BTreeSet<u16>) {
    if used.contains(&gid) {
        return;
    }
    used.insert(gid);
    // ttf-parser resolves composite glyphs transparently when outlining, so
    // collecting the referenced component GIDs requires inspecting the glyf
    // table directly where available.
    if let Some(raw_glyf) = face.raw_face().table(ttf_parser::Tag::from_bytes(b"glyf")) {
        if let Some(loca) = face.tables().loca {
            if let (Some(start), Some(end)) = (loca.glyph_range(ttf_parser::GlyphId(gid)).map(|r| r.start), loca.glyph_range(ttf_parser::GlyphId(gid)).map(|r| r.end)) {
                if end > start && (end as usize) <= raw_glyf.len() {
                    let glyph_data = &raw_glyf[start as usize..end as usize];
                    if glyph_data.len() >= 10 {
                        let n_contours = i16::from_be_bytes([glyph_data[0], glyph_data[1]]);
                        if n_contours < 0 {
                            collect_composite_gids(&glyph_data[10..], used);
                        }
                    }
                }
            }
        }
    }
}

fn collect_composite_gids(mut data: &[u8], used: &mut BTreeSet<u16>) {
    loop {
        if data.len() < 4 {
            return;
        }
        let flags = u16::from_be_bytes([data[0], data[1]]);
        let glyph_index = u16::from_be_bytes([data[2], data[3]]);
        used.insert(glyph_index);
        let mut offset = 4;
        const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
        const WE_HAVE_A_SCALE: u16 = 0x0008;
        const MORE_COMPONENTS: u16 = 0x0020;
        const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
        const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

        offset += if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
        if flags & WE_HAVE_A_SCALE != 0 {
            offset += 2;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            offset += 4;
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            offset += 8;
        }

        if flags & MORE_COMPONENTS == 0 || offset > data.len() {
            return;
        }
        data = &data[offset..];
    }
}

/// Builds the subsetted font program: parses `program`, determines which
/// SFNT tables can be trimmed (glyf/loca for TrueType outlines), and
/// re-serializes only the tables + glyphs actually referenced.
pub fn build_subset(program: &[u8], used_glyphs: &BTreeSet<u16>) -> Result<FontSubset, SubsetError> {
    if program.is_empty() {
        // Synthetic / base-14 fallback font: nothing to subset.
        return Ok(FontSubset { program: Vec::new(), gid_to_unicode: BTreeMap::new(), num_glyphs: 0 });
    }

    let face = ttf_parser::Face::parse(program, 0).map_err(|e| SubsetError(e.to_string()))?;
    let mut sfnt = SfntTables::parse(program).map_err(|e| SubsetError(e.0))?;

    if let (Some(glyf), Some(_loca)) = (sfnt.get(&*b"glyf").map(|g| g.to_vec()), sfnt.get(&*b"loca")) {
        let (trimmed_glyf, trimmed_loca) = trim_glyf_loca(&face, &glyf, used_glyphs)?;
        sfnt.insert(*b"glyf", trimmed_glyf);
        sfnt.insert(*b"loca", trimmed_loca);
    }

    let gid_to_unicode = build_to_unicode_map(&face, used_glyphs);

    Ok(FontSubset {
        program: sfnt.serialize(),
        gid_to_unicode,
        num_glyphs: face.number_of_glyphs(),
    })
}

/// Zeroes out (rather than physically removes, to keep `loca` offsets and
/// glyph indices identity-stable for the CID-to-GID map) every glyph not in
/// `used_glyphs`.
fn trim_glyf_loca(
    face: &ttf_parser::Face,
    glyf: &[u8],
    used_glyphs: &BTreeSet<u16>,
) -> Result<(Vec<u8>, Vec<u8>), SubsetError> {
    let loca = face.tables().loca.ok_or_else(|| SubsetError("missing loca table".to_string()))?;
    let num_glyphs = face.number_of_glyphs();
    let long_format = matches!(loca.len().cmp(&((num_glyphs as usize + 1) * 2)), std::cmp::Ordering::Greater);

    let mut new_glyf = Vec::new();
    let mut offsets = Vec::with_capacity(num_glyphs as usize + 1);
    offsets.push(0u32);

    for gid in 0..num_glyphs {
        let range = loca.glyph_range(ttf_parser::GlyphId(gid));
        let keep = used_glyphs.contains(&gid);
        if keep {
            if let Some(range) = range {
                if (range.end as usize) <= glyf.len() && range.end > range.start {
                    new_glyf.extend_from_slice(&glyf[range.start as usize..range.end as usize]);
                }
            }
        }
        while new_glyf.len() % 4 != 0 {
            new_glyf.push(0);
        }
        offsets.push(new_glyf.len() as u32);
    }

    let loca_bytes = if long_format {
        offsets.iter().flat_map(|o| o.to_be_bytes()).collect()
    } else {
        offsets.iter().flat_map(|o| ((o / 2) as u16).to_be_bytes()).collect()
    };

    Ok((new_glyf, loca_bytes))
}

/// Maps each used glyph back to the single Basic-Multilingual-Plane
/// codepoint that resolves to it, by probing the font's cmap. Multiple
/// codepoints mapping to the same glyph keep the first one found; the
/// `/ToUnicode` CMap only needs *a* valid preimage, not every one.
fn build_to_unicode_map(face: &ttf_parser::Face, used_glyphs: &BTreeSet<u16>) -> BTreeMap<u16, char> {
    let mut map = BTreeMap::new();
    let mut remaining: BTreeSet<u16> = used_glyphs.clone();
    remaining.remove(&0);
    for cp in 0x20u32..0x2FFFF {
        if remaining.is_empty() {
            break;
        }
        let Some(ch) = char::from_u32(cp) else { continue };
        if let Some(gid) = face.glyph_index(ch) {
            if remaining.remove(&gid.0) {
                map.insert(gid.0, ch);
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_program_subsets_to_empty() {
        let used = BTreeSet::new();
        let subset = build_subset(&[], &used).unwrap();
        assert!(subset.program.is_empty());
        assert_eq!(subset.num_glyphs, 0);
    }
}
