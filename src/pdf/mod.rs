//! The PDF builder (Component G): accumulates the object graph, assigns
//! object numbers lazily, and serializes a valid PDF 1.4 stream with a
//! working cross-reference table. Grounded on `pediferrous-pdfgen`'s
//! `Document`/`IdManager`/`PdfWriter` split — chosen over `printpdf`'s
//! higher-level `PdfDocument`/`Op`/`doc.save()` API specifically because
//! this emitter needs control the higher-level API hides: lazy/deferred
//! object-number assignment, exact per-object xref byte offsets, and a
//! panic-on-invariant-violation failure mode instead of always producing
//! *some* PDF bytes.

pub mod builder;
pub mod object;
pub mod resources;
pub mod writer;

pub use builder::{DocumentMetadata, PageHandle, PdfBuilder};
