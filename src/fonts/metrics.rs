//! Font metrics extraction. Built on `ttf-parser` (the teacher already uses
//! it for outline/advance access in `fonts.rs::measure_text_width`); this
//! module generalizes that single call site into the full `FontMetrics`
//! record the spec's data model names: unitsPerEm, ascender/descender/line
//! gap, cap-height/x-height, per-glyph advance + lsb, cmap, kerning.

use std::fmt;

#[derive(Debug)]
pub struct MetricsError(pub String);

impl fmt::Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-font metrics, independent of any one rendered run. `ttf_parser::Face`
/// already gives O(log n) cmap + kern lookups internally (binary search over
/// sorted subtable segments), satisfying the spec's lookup-complexity
/// requirement without a hand-rolled cmap table.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub cap_height: i16,
    pub x_height: i16,
    pub num_glyphs: u16,
    /// Whether this font has real outline/cmap data, or is the synthetic
    /// Helvetica-like stand-in used when no font file could be resolved.
    pub is_synthetic: bool,
}

impl FontMetrics {
    pub fn from_sfnt(bytes: &[u8]) -> Result<Self, MetricsError> {
        let face = ttf_parser::Face::parse(bytes, 0).map_err(|e| MetricsError(e.to_string()))?;
        let units_per_em = face.units_per_em();
        Ok(Self {
            units_per_em,
            ascender: face.ascender(),
            descender: face.descender(),
            line_gap: face.line_gap(),
            cap_height: face.capital_height().unwrap_or((units_per_em as i16 * 7) / 10),
            x_height: face.x_height().unwrap_or((units_per_em as i16 / 2)),
            num_glyphs: face.number_of_glyphs(),
            is_synthetic: false,
        })
    }

    /// Helvetica-like metrics used when no real font program is available,
    /// matching the teacher's `ensure_default` fallback (unitsPerEm = 1000,
    /// ascender = 750, descender = -250).
    pub fn synthetic() -> Self {
        Self {
            units_per_em: 1000,
            ascender: 750,
            descender: -250,
            line_gap: 0,
            cap_height: 700,
            x_height: 520,
            num_glyphs: 0,
            is_synthetic: true,
        }
    }

    /// Converts a font-unit value to device pixels at `font_size_px`.
    pub fn to_px(&self, font_units: i32, font_size_px: f32) -> f32 {
        font_units as f32 * font_size_px / self.units_per_em as f32
    }

    pub fn ascender_px(&self, font_size_px: f32) -> f32 {
        self.to_px(self.ascender as i32, font_size_px)
    }

    pub fn descender_px(&self, font_size_px: f32) -> f32 {
        self.to_px(self.descender as i32, font_size_px)
    }

    pub fn line_height_px(&self, font_size_px: f32) -> f32 {
        self.to_px((self.ascender - self.descender + self.line_gap) as i32, font_size_px)
    }
}

/// Looks up `cp -> glyph_id` in the parsed face's cmap, falling back to
/// glyph 0 (`.notdef`) for any codepoint outside the font, as required by
/// the spec's cmap-handling contract.
pub fn glyph_for_codepoint(face: &ttf_parser::Face, cp: char) -> u16 {
    face.glyph_index(cp).map(|g| g.0).unwrap_or(0)
}

/// Advance width of `gid` in font units, or 0 if the font has no `hmtx`
/// entry for it (clamped the way `numberOfHMetrics <= numGlyphs` implies:
/// glyphs past the last hmtx entry repeat its advance, which `ttf-parser`
/// already does internally).
pub fn advance_width(face: &ttf_parser::Face, gid: u16) -> u16 {
    face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0)
}

/// Kerning adjustment (font units) between `left` and `right` glyphs, 0 if
/// the font has no `kern` table or no pair entry — identical to "cumulative
/// advance" per the spec's boundary behavior for fonts without kerning.
pub fn kerning(face: &ttf_parser::Face, left: u16, right: u16) -> i16 {
    face.tables()
        .kern
        .and_then(|kern| {
            kern.subtables
                .into_iter()
                .find_map(|st| st.glyphs_kerning(ttf_parser::GlyphId(left), ttf_parser::GlyphId(right)))
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_metrics_match_teacher_defaults() {
        let m = FontMetrics::synthetic();
        assert_eq!(m.units_per_em, 1000);
        assert_eq!(m.ascender, 750);
        assert_eq!(m.descender, -250);
        assert!(m.is_synthetic);
    }

    #[test]
    fn to_px_scales_by_units_per_em() {
        let m = FontMetrics::synthetic();
        assert!((m.to_px(1000, 16.0) - 16.0).abs() < 1e-6);
    }
}
