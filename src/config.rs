//! Render configuration surface. `RenderOptions` is the serde-backed struct
//! realizing the public `options` bag that crosses the FFI boundary as JSON;
//! `pipeline.rs` re-exports `PageOrientation` from here rather than keeping
//! its own copy.

use serde::{Deserialize, Serialize};

use crate::pagination::PAGE_MARGIN_PT;

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    #[default]
    Portrait,
    Landscape,
}

/// Per-side page margins, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub fn uniform(pt: f32) -> Self {
        Self { top: pt, right: pt, bottom: pt, left: pt }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(PAGE_MARGIN_PT)
    }
}

/// Header/footer template configuration. Templates are small HTML fragments
/// re-laid-out per page; `{page}` and `{pages}` tokens are substituted with
/// the current/total page numbers before layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderFooterConfig {
    #[serde(default)]
    pub header_html: Option<String>,
    #[serde(default)]
    pub footer_html: Option<String>,
    /// Height reserved for the header band, in points.
    #[serde(default)]
    pub header_height: f32,
    /// Height reserved for the footer band, in points.
    #[serde(default)]
    pub footer_height: f32,
}

/// Font lookup configuration: explicit font directories to scan in addition
/// to whatever `Environment::list_fonts` returns for the default location,
/// plus a fallback family name when a requested family can't be resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontConfig {
    #[serde(default)]
    pub font_dirs: Vec<String>,
    #[serde(default)]
    pub fallback_family: Option<String>,
}

/// Document metadata embedded in the PDF `/Info` dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    Off,
    #[default]
    Warn,
    Debug,
}

/// The full render options bag. Mirrors the teacher's `layout_config`-plus-
/// `PipelineConfig` split but unified and serde-serializable end to end so it
/// can cross the FFI boundary as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "RenderOptions::default_page_width")]
    pub page_width: f32,
    #[serde(default = "RenderOptions::default_page_height")]
    pub page_height: f32,
    #[serde(default)]
    pub orientation: PageOrientation,
    #[serde(default)]
    pub margins: Margins,
    #[serde(default)]
    pub header_footer: HeaderFooterConfig,
    /// Base directory used to resolve relative `src`/`href` paths found in
    /// the input markup (images, stylesheets).
    #[serde(default)]
    pub resource_base_dir: Option<String>,
    #[serde(default)]
    pub font_config: FontConfig,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub debug_level: DebugLevel,
}

impl RenderOptions {
    fn default_page_width() -> f32 {
        595.28
    }

    fn default_page_height() -> f32 {
        841.89
    }

    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_width,
            PageOrientation::Landscape => self.page_height,
        }
    }

    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_height,
            PageOrientation::Landscape => self.page_width,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_width: Self::default_page_width(),
            page_height: Self::default_page_height(),
            orientation: PageOrientation::default(),
            margins: Margins::default(),
            header_footer: HeaderFooterConfig::default(),
            resource_base_dir: None,
            font_config: FontConfig::default(),
            metadata: DocumentMetadata::default(),
            debug_level: DebugLevel::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_a4_portrait() {
        let opts = RenderOptions::default();
        assert_eq!(opts.effective_width(), 595.28);
        assert_eq!(opts.effective_height(), 841.89);
    }

    #[test]
    fn landscape_swaps_effective_dimensions() {
        let mut opts = RenderOptions::default();
        opts.orientation = PageOrientation::Landscape;
        assert_eq!(opts.effective_width(), 841.89);
        assert_eq!(opts.effective_height(), 595.28);
    }

    #[test]
    fn json_round_trip_preserves_margins() {
        let mut opts = RenderOptions::default();
        opts.margins = Margins::uniform(72.0);
        let json = opts.to_json();
        let back = RenderOptions::from_json(&json).unwrap();
        assert_eq!(back.margins.top, 72.0);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let opts = RenderOptions::from_json("{}").unwrap();
        assert_eq!(opts.page_width, 595.28);
        assert_eq!(opts.debug_level, DebugLevel::Warn);
    }
}
