//! # pagecraft – HTML + CSS → paginated PDF rendering engine
//!
//! This crate provides a complete pipeline for converting HTML/CSS documents
//! into reproducible, paginated PDF documents. The pipeline stages are:
//!
//! 1. **Parse** – HTML string → DOM tree ([`dom`])
//! 2. **Style** – resolve inline styles and class rules into computed styles
//!    ([`style`])
//! 3. **Layout** – compute flexbox/grid layout with Taffy, measuring text
//!    against real font metrics ([`layout`], [`fonts`])
//! 4. **Paginate** – split into pages, honoring page-break hints and table
//!    row splitting ([`pagination`])
//! 5. **Compose** – lay out header/footer bands and substitute page tokens
//!    ([`headerfooter`])
//! 6. **Paint** – walk the paginated tree and emit PDF content streams and
//!    resources via the object-graph emitter ([`paint`], [`pdf`])
//!
//! Image decoding ([`image`]) and gradient-to-shading conversion
//! ([`gradient`]) are leaf subsystems consumed by [`paint`]. All side effects
//! (file reads, font enumeration, Brotli decompression, the clock) are
//! injected through the [`environment`] trait rather than reached for
//! directly, and [`config::RenderOptions`] is the single serde-backed options
//! bag that crosses the FFI boundary.
//!
//! A C-compatible FFI surface is exposed via the [`ffi`] module.

pub mod config;
pub mod dom;
pub mod environment;
pub mod error;
pub mod ffi;
pub mod fonts;
pub mod gradient;
pub mod headerfooter;
pub mod image;
pub mod layout;
pub mod layout_config;
pub mod paint;
pub mod pagination;
pub mod pdf;
pub mod pipeline;
pub mod style;
pub mod templates;

// Re-exports for convenience
pub use config::PageOrientation;
pub use error::PagecraftError;
pub use pipeline::{generate_pdf, generate_pdf_from_html};
