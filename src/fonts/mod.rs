//! Font subsystem: ingest TTF/OTF/WOFF/WOFF2 bytes, expose a uniform
//! [`LoadedFont`] to the shaper and PDF emitter, and own per-render font
//! subsetting. Grounded on the teacher's `fonts.rs` (`FontManager`/`FontKey`
//! keyed cache, synthetic-metrics fallback) but generalized: font bytes are
//! parsed with `ttf-parser` regardless of source container, WOFF/WOFF2 are
//! first reconstructed to raw SFNT bytes by [`woff`]/[`woff2`].

pub mod metrics;
pub mod sfnt;
pub mod shaping;
pub mod subset;
pub mod woff;
pub mod woff2;

use std::collections::HashMap;

use crate::environment::Environment;
use crate::error::PagecraftError;

pub use metrics::FontMetrics;
pub use shaping::{GlyphPosition, GlyphRun};

/// Uniquely identifies a font within a render: family name plus the two
/// style axes the style resolver deals in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: impl Into<String>, bold: bool, italic: bool) -> Self {
        Self { family: family.into(), bold, italic }
    }
}

/// A parsed, ready-to-use font: raw program bytes plus derived metrics.
/// Frozen once constructed, owned by the [`FontRegistry`] for the process
/// lifetime of a single render.
pub struct LoadedFont {
    pub key: FontKey,
    /// Raw SFNT bytes (WOFF/WOFF2 already reconstructed to this form).
    pub program: Vec<u8>,
    pub metrics: FontMetrics,
    /// Glyph IDs touched by this render; fed to [`subset`] at finalization.
    pub used_glyphs: std::cell::RefCell<std::collections::BTreeSet<u16>>,
}

impl LoadedFont {
    fn from_sfnt_bytes(key: FontKey, program: Vec<u8>) -> Result<Self, PagecraftError> {
        let metrics = FontMetrics::from_sfnt(&program)
            .map_err(|e| PagecraftError::parse(format!("font parse failed: {e}")))?;
        Ok(Self {
            key,
            program,
            metrics,
            used_glyphs: std::cell::RefCell::new(std::collections::BTreeSet::new()),
        })
    }

    /// Records that `gid` was painted somewhere in this render, and all of
    /// its composite-glyph dependencies.
    pub fn mark_used(&self, gid: u16) {
        let face = match ttf_parser::Face::parse(&self.program, 0) {
            Ok(f) => f,
            Err(_) => return,
        };
        subset::walk_composite_closure(&face, gid, &mut self.used_glyphs.borrow_mut());
    }

    /// Builds the embedded, subsetted font program for the PDF emitter:
    /// glyph 0, every used glyph and its composite dependencies, a trimmed
    /// glyf/loca if this is TrueType-outline font, recomputed checksums, and
    /// a sfnt directory sorted by tag.
    pub fn build_subset(&self) -> Result<subset::FontSubset, PagecraftError> {
        let mut used = self.used_glyphs.borrow().clone();
        used.insert(0);
        subset::build_subset(&self.program, &used)
            .map_err(|e| PagecraftError::backend(format!("font subsetting failed: {e}")))
    }
}

/// Owns every font parsed during one render; fonts are parsed at most once
/// per `(family, bold, italic)` key.
#[derive(Default)]
pub struct FontRegistry {
    fonts: HashMap<FontKey, LoadedFont>,
    default_key: Option<FontKey>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every font [`Environment::list_fonts`] reports for `font_dirs`,
    /// falling back to a synthetic Helvetica-like metrics set (matching the
    /// teacher's `ensure_default`) when no real font is available so layout
    /// and measurement never stall waiting on a missing resource.
    pub fn load_all(
        &mut self,
        env: &dyn Environment,
        font_dirs: &[String],
    ) -> Result<(), PagecraftError> {
        for dir in font_dirs {
            let listed = env.list_fonts(dir)?;
            for listing in listed {
                let key = FontKey::new(listing.family.clone(), listing.weight >= 600, listing.italic);
                if self.fonts.contains_key(&key) {
                    continue;
                }
                let bytes = env.read_binary(&listing.src)?;
                if let Ok(font) = self.load_bytes(key.clone(), bytes) {
                    if self.default_key.is_none() {
                        self.default_key = Some(key.clone());
                    }
                    self.fonts.insert(key, font);
                }
            }
        }
        if self.fonts.is_empty() {
            self.ensure_default();
        }
        Ok(())
    }

    /// Parses raw font bytes (TTF/OTF raw, or WOFF/WOFF2 reconstructed first)
    /// into a [`LoadedFont`] and registers it under `key`.
    pub fn load_bytes(&mut self, key: FontKey, bytes: Vec<u8>) -> Result<&LoadedFont, PagecraftError> {
        let sfnt_bytes = reconstruct_to_sfnt(&bytes)?;
        let font = LoadedFont::from_sfnt_bytes(key.clone(), sfnt_bytes)?;
        self.fonts.insert(key.clone(), font);
        Ok(self.fonts.get(&key).unwrap())
    }

    /// Installs a synthetic Helvetica-like metrics set used when no real
    /// font file could be resolved; text still measures and paints (as a
    /// Type1 base-14 fallback) without the render aborting.
    pub fn ensure_default(&mut self) {
        let key = FontKey::new("Helvetica", false, false);
        if !self.fonts.contains_key(&key) {
            self.fonts.insert(
                key.clone(),
                LoadedFont {
                    key: key.clone(),
                    program: Vec::new(),
                    metrics: FontMetrics::synthetic(),
                    used_glyphs: std::cell::RefCell::new(std::collections::BTreeSet::new()),
                },
            );
        }
        if self.default_key.is_none() {
            self.default_key = Some(key);
        }
    }

    pub fn get(&self, key: &FontKey) -> Option<&LoadedFont> {
        self.fonts.get(key)
    }

    pub fn default_font(&self) -> Option<&LoadedFont> {
        self.default_key.as_ref().and_then(|k| self.fonts.get(k))
    }

    /// Best-effort font lookup: exact key, else same family ignoring
    /// weight/style, else the registry default.
    pub fn resolve(&self, key: &FontKey) -> Option<&LoadedFont> {
        self.get(key)
            .or_else(|| self.fonts.values().find(|f| f.key.family == key.family))
            .or_else(|| self.default_font())
    }

    pub fn has_real_fonts(&self) -> bool {
        self.fonts.values().any(|f| !f.program.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedFont> {
        self.fonts.values()
    }
}

/// Reconstructs WOFF/WOFF2 container bytes into a raw SFNT byte stream;
/// passes already-raw TTF/OTF bytes through unchanged.
fn reconstruct_to_sfnt(bytes: &[u8]) -> Result<Vec<u8>, PagecraftError> {
    if bytes.len() < 4 {
        return Err(PagecraftError::parse("font file too short to contain a tag"));
    }
    match &bytes[0..4] {
        b"wOFF" => woff::inflate_to_sfnt(bytes)
            .map_err(|e| PagecraftError::parse(format!("WOFF reconstruction failed: {e}"))),
        b"wOF2" => Err(PagecraftError::backend(
            "WOFF2 fonts require decompress_brotli via Environment; use FontRegistry::load_woff2",
        )),
        _ => Ok(bytes.to_vec()),
    }
}

impl FontRegistry {
    /// WOFF2 needs the caller's Brotli backend, so it has its own entry
    /// point rather than going through [`reconstruct_to_sfnt`].
    pub fn load_woff2(
        &mut self,
        key: FontKey,
        bytes: &[u8],
        env: &dyn Environment,
    ) -> Result<&LoadedFont, PagecraftError> {
        let sfnt_bytes = woff2::reconstruct(bytes, env)
            .map_err(|e| PagecraftError::backend(format!("WOFF2 reconstruction failed: {e}")))?;
        let font = LoadedFont::from_sfnt_bytes(key.clone(), sfnt_bytes)?;
        self.fonts.insert(key.clone(), font);
        Ok(self.fonts.get(&key).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_falls_back_to_synthetic_default_when_empty() {
        let mut reg = FontRegistry::new();
        reg.ensure_default();
        assert!(reg.default_font().is_some());
        assert!(!reg.has_real_fonts());
    }

    #[test]
    fn resolve_falls_back_to_default_for_unknown_family() {
        let mut reg = FontRegistry::new();
        reg.ensure_default();
        let found = reg.resolve(&FontKey::new("Nonexistent", false, false));
        assert!(found.is_some());
    }
}
