//! Header/footer composition (Component F continued): headers and footers
//! are themselves small HTML documents, re-entered through the same
//! DOM → style → layout path as the main document but constrained to the
//! page's content width and a fixed band height. Grounded on `pagination.rs`'s
//! coordinate-accumulation convention — a header/footer tree is laid out once
//! per render, then its boxes are cloned onto every page with a page-absolute
//! y offset (`0` for the header band, `page_height - footer_height` for the
//! footer band).
//!
//! Token substitution (`{page}`, `{{page}}`, `pageNumber`, `pages`,
//! `totalPages`, `title`, `date`, plus anything else the caller doesn't
//! recognize) happens on the raw HTML string before it is parsed, so the text
//! nodes that reach layout already contain their final page-specific values.

use crate::config::HeaderFooterConfig;
use crate::dom::{body_children, parse_html};
use crate::fonts::FontRegistry;
use crate::layout::compute_layout;
use crate::layout_config::LayoutBox;
use crate::pagination::{build_layout_box, PAGE_MARGIN_PT};
use crate::style::build_styled_tree;

/// Replaces recognized tokens in `template`, accepting both the `{name}` and
/// `{{name}}` spellings. A token not in the recognized set (but still
/// well-formed, i.e. `{something}`) is replaced with the empty string rather
/// than left in place, matching the "unknown token -> empty" rule.
pub fn substitute_tokens(template: &str, page: usize, pages: usize, title: &str, date: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            let double = i + 1 < bytes.len() && bytes[i + 1] == b'{';
            let start = if double { i + 2 } else { i + 1 };
            if let Some(rel_end) = template[start..].find(if double { "}}" } else { "}" }) {
                let end = start + rel_end;
                // Reject a `{{name}` / `{name}}` mismatch by requiring the
                // matching closer to actually be there.
                let closer_len = if double { 2 } else { 1 };
                let name = template[start..end].trim();
                out.push_str(&resolve_token(name, page, pages, title, date));
                i = end + closer_len;
                continue;
            }
        }
        let ch_len = template[i..].chars().next().map(|c| c.len_utf8()).unwrap_or(1);
        out.push_str(&template[i..i + ch_len]);
        i += ch_len;
    }
    out
}

fn resolve_token(name: &str, page: usize, pages: usize, title: &str, date: &str) -> String {
    match name {
        "page" | "pageNumber" => page.to_string(),
        "pages" | "totalPages" => pages.to_string(),
        "title" => title.to_string(),
        "date" => date.to_string(),
        _ => String::new(),
    }
}

/// One resolved header or footer band, already laid out at its final page
/// width/height and ready to be offset onto every page.
pub struct Band {
    pub boxes: Vec<LayoutBox>,
    pub height: f32,
}

/// Lays out a header or footer fragment for one specific page number. Layout
/// is re-run per page (rather than once and cloned) because `{page}` tokens
/// mean different pages render different text, which can reflow line counts.
fn layout_band(
    html_template: &str,
    max_height: f32,
    page_width: f32,
    page: usize,
    total_pages: usize,
    title: &str,
    date: &str,
    fonts: &FontRegistry,
) -> Band {
    let substituted = substitute_tokens(html_template, page, total_pages, title, date);
    let dom = parse_html(&substituted);
    let body = body_children(&dom);
    let styled = build_styled_tree(&body, None);
    // No page margin inside a header/footer band: its content area is the
    // full page content width, offset into place by the caller.
    let boxes = compute_layout(&styled, page_width, 0.0, fonts);
    let mut out_boxes = Vec::with_capacity(boxes.len());
    let mut used_height = 0.0f32;
    for pbox in &boxes {
        let lb = build_layout_box(pbox, pbox.x, pbox.y, fonts);
        used_height = used_height.max(lb.y + lb.height);
        out_boxes.push(lb);
    }
    Band { boxes: out_boxes, height: used_height.min(max_height) }
}

/// Builds the header band for one page, or an empty zero-height band when no
/// header template is configured (an empty header returns height 0 and
/// produces no boxes).
pub fn header_for_page(
    cfg: &HeaderFooterConfig,
    page_width: f32,
    page: usize,
    total_pages: usize,
    title: &str,
    date: &str,
    fonts: &FontRegistry,
) -> Band {
    match &cfg.header_html {
        Some(html) if !html.trim().is_empty() => {
            let max_height = if cfg.header_height > 0.0 { cfg.header_height } else { PAGE_MARGIN_PT };
            layout_band(html, max_height, page_width, page, total_pages, title, date, fonts)
        }
        _ => Band { boxes: Vec::new(), height: 0.0 },
    }
}

/// Builds the footer band for one page; `page_height` is needed so the
/// returned boxes can be offset to sit flush with the bottom of the page by
/// the caller.
pub fn footer_for_page(
    cfg: &HeaderFooterConfig,
    page_width: f32,
    page: usize,
    total_pages: usize,
    title: &str,
    date: &str,
    fonts: &FontRegistry,
) -> Band {
    match &cfg.footer_html {
        Some(html) if !html.trim().is_empty() => {
            let max_height = if cfg.footer_height > 0.0 { cfg.footer_height } else { PAGE_MARGIN_PT };
            layout_band(html, max_height, page_width, page, total_pages, title, date, fonts)
        }
        _ => Band { boxes: Vec::new(), height: 0.0 },
    }
}

/// Shifts every box in a band down by `y_offset` (used to place the footer
/// band flush with the bottom of the page).
pub fn offset_band(band: &mut Band, y_offset: f32) {
    for lb in &mut band.boxes {
        shift_box(lb, y_offset);
    }
}

fn shift_box(lb: &mut LayoutBox, y_offset: f32) {
    lb.y += y_offset;
    for child in &mut lb.children {
        shift_box(child, y_offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_single_and_double_brace_forms() {
        let out = substitute_tokens("Page {page} of {{pages}}", 2, 5, "Doc", "2026-07-28");
        assert_eq!(out, "Page 2 of 5");
    }

    #[test]
    fn unrecognized_token_becomes_empty() {
        let out = substitute_tokens("Hello {nonsense} World", 1, 1, "Doc", "2026-07-28");
        assert_eq!(out, "Hello  World");
    }

    #[test]
    fn recognizes_legacy_pagenumber_and_totalpages_aliases() {
        let out = substitute_tokens("{pageNumber}/{totalPages}", 3, 9, "Doc", "2026-07-28");
        assert_eq!(out, "3/9");
    }

    #[test]
    fn empty_header_template_produces_no_boxes() {
        let cfg = HeaderFooterConfig::default();
        let mut fonts = FontRegistry::new();
        fonts.ensure_default();
        let band = header_for_page(&cfg, 595.0, 1, 1, "Doc", "2026-07-28", &fonts);
        assert_eq!(band.height, 0.0);
        assert!(band.boxes.is_empty());
    }

    #[test]
    fn header_with_content_produces_boxes() {
        let cfg = HeaderFooterConfig {
            header_html: Some("<p>{title} - page {page}</p>".to_string()),
            header_height: 40.0,
            ..Default::default()
        };
        let mut fonts = FontRegistry::new();
        fonts.ensure_default();
        let band = header_for_page(&cfg, 595.0, 1, 3, "My Document", "2026-07-28", &fonts);
        assert!(!band.boxes.is_empty());
    }
}
