//! Pipeline – ties together parsing, styling, layout, pagination, header/
//! footer composition, and PDF painting into a single function call.

use crate::config::RenderOptions;
use crate::dom::{body_children, parse_html};
use crate::environment::Environment;
use crate::error::PagecraftError;
use crate::fonts::FontRegistry;
use crate::headerfooter::{footer_for_page, header_for_page, offset_band};
use crate::layout::compute_layout;
use crate::layout_config::LayoutConfig;
use crate::pagination::paginate;
use crate::paint::paint;
use crate::pdf::builder::DocumentMetadata as PdfDocumentMetadata;
use crate::style::build_styled_tree;

pub use crate::config::PageOrientation;

/// Builds a [`FontRegistry`] the way `RenderOptions::font_config` asks for:
/// every directory it names, falling back to the synthetic default when
/// nothing could be loaded (matches `FontRegistry::load_all`'s own fallback).
fn build_font_registry(options: &RenderOptions, env: &dyn Environment) -> Result<FontRegistry, PagecraftError> {
    let mut fonts = FontRegistry::new();
    fonts.load_all(env, &options.font_config.font_dirs)?;
    Ok(fonts)
}

/// Single margin value layout/pagination are built around. Header/footer
/// bands are reserved space, not separate margins, so the vertical margin
/// actually available to body content shrinks by whichever band is taller;
/// the same value is reused for the horizontal margin, averaging away the
/// configured left/right asymmetry. An approximation of true per-side
/// margins — see DESIGN.md.
fn effective_page_margin(options: &RenderOptions) -> f32 {
    let m = &options.margins;
    let vertical = (m.top + m.bottom) / 2.0;
    let horizontal = (m.left + m.right) / 2.0;
    let band = options.header_footer.header_height.max(options.header_footer.footer_height);
    (vertical + horizontal) / 2.0 + band
}

fn metadata_from(options: &RenderOptions, env: &dyn Environment) -> PdfDocumentMetadata {
    PdfDocumentMetadata {
        title: options.metadata.title.clone(),
        author: options.metadata.author.clone(),
        subject: options.metadata.subject.clone(),
        keywords: options.metadata.keywords.clone(),
        producer: "pagecraft".to_string(),
        created: env.now(),
    }
}

/// Runs layout, pagination, and header/footer composition without painting.
/// Exposed separately so callers (and tests) can inspect the intermediate
/// representation before it is handed to the PDF emitter.
pub fn compute_layout_config(
    html: &str,
    options: &RenderOptions,
    env: &dyn Environment,
) -> Result<(LayoutConfig, FontRegistry), PagecraftError> {
    let dom = parse_html(html);
    let body = body_children(&dom);
    let styled = build_styled_tree(&body, None);
    let fonts = build_font_registry(options, env)?;

    let eff_w = options.effective_width();
    let eff_h = options.effective_height();
    let page_margin = effective_page_margin(options);

    let boxes = compute_layout(&styled, eff_w, page_margin, &fonts);
    let mut layout_config = paginate(&boxes, eff_w, eff_h, page_margin, &fonts);
    layout_config.title = options
        .metadata
        .title
        .clone()
        .unwrap_or_else(|| "pagecraft output".to_string());

    compose_header_footer(&mut layout_config, options, &fonts, env);
    Ok((layout_config, fonts))
}

/// Lays out a header/footer band for every page and merges its boxes onto
/// that page's own box list at the page-absolute position the band occupies.
fn compose_header_footer(
    layout_config: &mut LayoutConfig,
    options: &RenderOptions,
    fonts: &FontRegistry,
    env: &dyn Environment,
) {
    let cfg = &options.header_footer;
    if cfg.header_html.is_none() && cfg.footer_html.is_none() {
        return;
    }
    let page_width = layout_config.page_width_pt;
    let page_height = layout_config.page_height_pt;
    let total_pages = layout_config.pages.len();
    let title = layout_config.title.clone();
    let date = env.now().iso_date();

    for page in layout_config.pages.iter_mut() {
        let page_number = page.page_index + 1;

        let mut header = header_for_page(cfg, page_width, page_number, total_pages, &title, &date, fonts);
        if header.height > 0.0 {
            offset_band(&mut header, options.margins.top);
            page.boxes.extend(header.boxes);
        }

        let mut footer = footer_for_page(cfg, page_width, page_number, total_pages, &title, &date, fonts);
        if footer.height > 0.0 {
            let footer_y = page_height - options.margins.bottom - cfg.footer_height.max(footer.height);
            offset_band(&mut footer, footer_y);
            page.boxes.extend(footer.boxes);
        }
    }
}

/// Full render: HTML in, PDF bytes (plus the intermediate layout, for
/// callers that want to inspect or cache it) out.
pub fn generate_pdf(
    html: &str,
    options: &RenderOptions,
    env: &dyn Environment,
) -> Result<(Vec<u8>, LayoutConfig), PagecraftError> {
    let (layout_config, fonts) = compute_layout_config(html, options, env)?;
    let metadata = metadata_from(options, env);
    let pdf_bytes = paint(&layout_config, &fonts, env, Some(metadata))?;
    Ok((pdf_bytes, layout_config))
}

/// Convenience entry point for callers who just want bytes back, using
/// default options and the local filesystem environment.
pub fn generate_pdf_from_html(html: &str) -> Result<Vec<u8>, PagecraftError> {
    let options = RenderOptions::default();
    let env = crate::environment::LocalEnvironment;
    let (bytes, _) = generate_pdf(html, &options, &env)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::LocalEnvironment;

    #[test]
    fn pipeline_basic() {
        let html = "<h1>Hello</h1><p>World</p>";
        let options = RenderOptions::default();
        let env = LocalEnvironment;
        let (bytes, config) = generate_pdf(html, &options, &env).unwrap();
        assert!(!bytes.is_empty());
        assert!(!config.pages.is_empty());
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn header_and_footer_tokens_are_resolved_per_page() {
        let mut html = String::new();
        for i in 0..80 {
            html.push_str(&format!("<p>Paragraph {i} with enough text to take real space.</p>"));
        }
        let mut options = RenderOptions::default();
        options.header_footer.header_html = Some("<p>{title}</p>".to_string());
        options.header_footer.footer_html = Some("<p>Page {page} of {pages}</p>".to_string());
        options.header_footer.header_height = 30.0;
        options.header_footer.footer_height = 30.0;
        options.metadata.title = Some("Acceptance Report".to_string());
        let env = LocalEnvironment;

        let (layout_config, _fonts) = compute_layout_config(&html, &options, &env).unwrap();
        assert!(layout_config.pages.len() > 1);
        for page in &layout_config.pages {
            assert!(page.boxes.iter().any(|b| b.text.is_some()));
        }
    }

    #[test]
    fn generate_pdf_from_html_produces_valid_pdf_header() {
        let bytes = generate_pdf_from_html("<p>Quick</p>").unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }
}
