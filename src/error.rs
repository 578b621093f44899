//! Structured error type for the render pipeline.
//!
//! Mirrors the five error kinds the public API promises: parse failures that
//! aborted rather than recovered, missing resources, decompression/raster
//! backend failures, overflow (never actually surfaced — kept for
//! completeness and FFI matching), and internal invariant violations (which
//! in practice panic rather than flow through this type — see
//! [`invariant_violation`]).

use std::fmt;

/// The structured error returned by [`crate::pipeline::render`] and friends.
///
/// `ResourceUnavailable` and `Backend` abort the render outright. `Parse` is
/// only ever constructed for *essential* parse failures (e.g. a font with no
/// SFNT tables) — non-essential parse problems (an unknown CSS property, an
/// unrecognised font table) are logged and recovered from locally, never
/// raised as an error.
#[derive(Debug)]
pub enum PagecraftError {
    Parse { detail: String },
    ResourceUnavailable { detail: String },
    Backend { detail: String },
    /// Present for API completeness; the pipeline never actually returns
    /// this — oversized content is clipped to its page instead.
    LayoutOverflow { detail: String },
}

impl PagecraftError {
    pub fn kind(&self) -> &'static str {
        match self {
            PagecraftError::Parse { .. } => "ParseError",
            PagecraftError::ResourceUnavailable { .. } => "ResourceUnavailable",
            PagecraftError::Backend { .. } => "BackendError",
            PagecraftError::LayoutOverflow { .. } => "LayoutOverflow",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            PagecraftError::Parse { detail }
            | PagecraftError::ResourceUnavailable { detail }
            | PagecraftError::Backend { detail }
            | PagecraftError::LayoutOverflow { detail } => detail,
        }
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        PagecraftError::Parse { detail: detail.into() }
    }

    pub fn resource_unavailable(detail: impl Into<String>) -> Self {
        PagecraftError::ResourceUnavailable { detail: detail.into() }
    }

    pub fn backend(detail: impl Into<String>) -> Self {
        PagecraftError::Backend { detail: detail.into() }
    }
}

impl fmt::Display for PagecraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.detail())
    }
}

impl std::error::Error for PagecraftError {}

/// Panic with a message referencing the offending PDF object number.
///
/// Corresponds to the spec's `PdfInvariantViolation`: a dangling reference,
/// an unassigned object number, or a resource registered twice with
/// different data under the same alias are all programming errors, not
/// recoverable conditions — the emitter panics rather than serialize a
/// malformed PDF.
pub fn invariant_violation(object_number: u32, message: &str) -> ! {
    panic!("PDF invariant violation on object {object_number}: {message}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_detail_round_trip() {
        let e = PagecraftError::parse("missing head table");
        assert_eq!(e.kind(), "ParseError");
        assert_eq!(e.detail(), "missing head table");
    }

    #[test]
    #[should_panic(expected = "PDF invariant violation on object 7")]
    fn invariant_violation_panics_with_object_number() {
        invariant_violation(7, "dangling reference");
    }
}
