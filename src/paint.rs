//! Content-stream painter (Component H): walks a paginated [`LayoutConfig`]
//! and emits page content streams plus registers page resources through
//! [`PdfBuilder`]. Grounded on the teacher's `render.rs` (`render_box`'s
//! recursive walk order and data-URI image handling) but retargeted at the
//! object-graph emitter instead of `printpdf`, with real embedded-font
//! shaping (`fonts::shaping::shape_text`) replacing builtin-WinAnsi-only
//! text.
//!
//! Paint order per box, matching the teacher: background, border, text,
//! image, then children (rounded corners, shadows and gradients are new
//! steps inserted around the background/border stage). A box with a CSS
//! `transform` is wrapped in its own `q … cm cm cm … Q` around its own
//! center before any of that, so children inherit the local frame too.

use std::collections::HashMap;
use std::fmt::Write as _;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

use crate::environment::Environment;
use crate::error::PagecraftError;
use crate::fonts::shaping::shape_text;
use crate::fonts::{FontKey, FontRegistry, LoadedFont};
use crate::gradient::{linear_gradient_to_shading, GradientStop as ShadingStop, LinearGradient};
use crate::image;
use crate::layout_config::{LayoutBox, LayoutConfig};
use crate::pdf::builder::{DocumentMetadata, PageHandle, PdfBuilder};

/// Control-point distance factor for a cubic Bézier approximating a
/// quarter-circle arc.
const CORNER_K: f32 = 0.5522847498307936;

/// Decoded image bytes keyed by their `src` string, cached across the whole
/// document so a repeated `<img>` is decoded once.
type ImageCache = HashMap<String, Option<image::Image>>;

/// Paints every page of `config` into a finished PDF byte stream.
pub fn paint(
    config: &LayoutConfig,
    fonts: &FontRegistry,
    env: &dyn Environment,
    metadata: Option<DocumentMetadata>,
) -> Result<Vec<u8>, PagecraftError> {
    let mut builder = PdfBuilder::new();
    let mut image_cache: ImageCache = HashMap::new();

    let mut pages_painted = 0usize;
    for page_layout in &config.pages {
        let page = builder.add_page(config.page_width_pt, config.page_height_pt);
        let mut content = String::new();
        for lbox in &page_layout.boxes {
            paint_box(&mut builder, &page, fonts, env, &mut image_cache, config.page_height_pt, &mut content, lbox, 1.0);
        }
        builder.set_content(&page, content.into_bytes());
        pages_painted += 1;
    }

    if pages_painted == 0 {
        let page = builder.add_page(config.page_width_pt, config.page_height_pt);
        builder.set_content(&page, Vec::new());
    }

    Ok(builder.finish(metadata))
}

#[allow(clippy::too_many_arguments)]
fn paint_box(
    builder: &mut PdfBuilder,
    page: &PageHandle,
    fonts: &FontRegistry,
    env: &dyn Environment,
    image_cache: &mut ImageCache,
    page_height: f32,
    out: &mut String,
    lbox: &LayoutBox,
    inherited_alpha: f32,
) {
    let alpha = inherited_alpha * lbox.opacity.clamp(0.0, 1.0);

    // PDF coordinates have their origin at the bottom-left with Y increasing
    // upward; the layout tree has its origin at the page's top-left with Y
    // increasing downward.
    let x0 = lbox.x;
    let x1 = lbox.x + lbox.width;
    let y1 = page_height - lbox.y; // top edge, in PDF space
    let y0 = y1 - lbox.height; // bottom edge, in PDF space

    let has_alpha_group = alpha < 0.999;
    if has_alpha_group {
        let alias = builder.register_ext_gstate(page, alpha, alpha);
        let _ = writeln!(out, "q /{alias} gs");
    } else {
        out.push_str("q\n");
    }

    let has_transform = lbox.transform.is_some();
    if let Some([a, b, c, d, e, f]) = lbox.transform {
        // Shearing components have their sign flipped to account for the
        // layout engine's Y-down frame vs. PDF's Y-up frame; rotate/translate
        // the box around its own center rather than the page origin.
        let cx = (x0 + x1) / 2.0;
        let cy = (y0 + y1) / 2.0;
        out.push_str("q\n");
        let _ = writeln!(out, "1 0 0 1 {:.3} {:.3} cm", -cx, -cy);
        let _ = writeln!(out, "{a:.5} {:.5} {:.5} {d:.5} {e:.3} {f:.3} cm", -b, -c);
        let _ = writeln!(out, "1 0 0 1 {cx:.3} {cy:.3} cm");
    }

    paint_box_shadows(builder, page, out, lbox, x0, y0, x1, y1);
    paint_background(builder, page, out, lbox, x0, y0, x1, y1);
    paint_border(out, lbox, x0, y0, x1, y1);
    paint_text(builder, page, fonts, out, lbox, y1);
    paint_image(builder, page, env, image_cache, out, lbox, y1);

    // Children are painted inside the same transform scope, since CSS
    // transforms apply to the whole subtree visually while layout itself
    // never accounts for them (a transformed box keeps its static flow
    // position; only painting is affected).
    for child in &lbox.children {
        paint_box(builder, page, fonts, env, image_cache, page_height, out, child, alpha);
    }

    if has_transform {
        out.push_str("Q\n");
    }

    out.push_str("Q\n");
}

/// Appends a closed rounded-rectangle path (without a paint operator) to
/// `out`. Falls back to four straight edges when every radius is ~0.
fn append_rounded_rect_path(out: &mut String, x0: f32, y0: f32, x1: f32, y1: f32, tl: f32, tr: f32, br: f32, bl: f32) {
    if tl < 0.01 && tr < 0.01 && br < 0.01 && bl < 0.01 {
        let _ = writeln!(out, "{x0:.3} {y0:.3} m {x1:.3} {y0:.3} l {x1:.3} {y1:.3} l {x0:.3} {y1:.3} l h");
        return;
    }
    let k = CORNER_K;
    let _ = writeln!(out, "{:.3} {:.3} m", x0 + tl, y1);
    let _ = writeln!(out, "{:.3} {:.3} l", x1 - tr, y1);
    let _ = writeln!(
        out,
        "{:.3} {:.3} {:.3} {:.3} {:.3} {:.3} c",
        x1 - tr + tr * k,
        y1,
        x1,
        y1 - tr + tr * k,
        x1,
        y1 - tr
    );
    let _ = writeln!(out, "{:.3} {:.3} l", x1, y0 + br);
    let _ = writeln!(
        out,
        "{:.3} {:.3} {:.3} {:.3} {:.3} {:.3} c",
        x1,
        y0 + br - br * k,
        x1 - br + br * k,
        y0,
        x1 - br,
        y0
    );
    let _ = writeln!(out, "{:.3} {:.3} l", x0 + bl, y0);
    let _ = writeln!(
        out,
        "{:.3} {:.3} {:.3} {:.3} {:.3} {:.3} c",
        x0 + bl - bl * k,
        y0,
        x0,
        y0 + bl - bl * k,
        x0,
        y0 + bl
    );
    let _ = writeln!(out, "{:.3} {:.3} l", x0, y1 - tl);
    let _ = writeln!(
        out,
        "{:.3} {:.3} {:.3} {:.3} {:.3} {:.3} c",
        x0,
        y1 - tl + tl * k,
        x0 + tl - tl * k,
        y1,
        x0 + tl,
        y1
    );
    out.push_str("h\n");
}

/// Approximates a CSS `box-shadow` as a handful of concentric filled rounded
/// rects — a coarse but cheap stand-in for a real Gaussian blur, which the
/// content-stream model has no direct equivalent for. The shadow's own
/// alpha (and an inset shadow's direction) is realized through an ExtGState
/// `/ca` entry rather than baked into the fill color, so it composites
/// correctly over whatever the box itself already painted.
fn paint_box_shadows(builder: &mut PdfBuilder, page: &PageHandle, out: &mut String, lbox: &LayoutBox, x0: f32, y0: f32, x1: f32, y1: f32) {
    let (tl, tr, br, bl) = (lbox.border_radius[0], lbox.border_radius[1], lbox.border_radius[2], lbox.border_radius[3]);
    for shadow in &lbox.box_shadows {
        let steps = ((shadow.blur / 2.0).ceil() as i32).clamp(1, 8);
        let (r, g, b, a) = (shadow.color[0], shadow.color[1], shadow.color[2], shadow.color[3]);
        let alias = builder.register_ext_gstate(page, a, a);
        out.push_str("q\n");
        let _ = writeln!(out, "/{alias} gs");
        let _ = writeln!(out, "{r:.3} {g:.3} {b:.3} rg");

        if shadow.inset {
            // Clipped to the box itself, then filled from the most inset
            // ring outward so the shadow reads as emanating inward from the
            // border rather than spilling past it.
            append_rounded_rect_path(out, x0, y0, x1, y1, tl, tr, br, bl);
            out.push_str("W n\n");
            for i in (1..=steps).rev() {
                let t = i as f32 / steps as f32;
                let spread = shadow.blur * t;
                let ix0 = x0 + shadow.offset_x + spread;
                let ix1 = x1 + shadow.offset_x - spread;
                let iy0 = y0 - shadow.offset_y + spread;
                let iy1 = y1 - shadow.offset_y - spread;
                if ix1 > ix0 && iy1 > iy0 {
                    append_rounded_rect_path(out, ix0, iy0, ix1, iy1, tl, tr, br, bl);
                    out.push_str("f\n");
                }
            }
        } else {
            for i in (1..=steps).rev() {
                let t = i as f32 / steps as f32;
                let spread = shadow.blur * t;
                let sx0 = x0 + shadow.offset_x - spread;
                let sx1 = x1 + shadow.offset_x + spread;
                let sy0 = y0 - shadow.offset_y - spread;
                let sy1 = y1 - shadow.offset_y + spread;
                append_rounded_rect_path(out, sx0, sy0, sx1, sy1, 0.0, 0.0, 0.0, 0.0);
                out.push_str("f\n");
            }
        }
        out.push_str("Q\n");
    }
}

fn paint_background(builder: &mut PdfBuilder, page: &PageHandle, out: &mut String, lbox: &LayoutBox, x0: f32, y0: f32, x1: f32, y1: f32) {
    let (tl, tr, br, bl) = (lbox.border_radius[0], lbox.border_radius[1], lbox.border_radius[2], lbox.border_radius[3]);

    if let Some(grad) = &lbox.background_gradient {
        let gradient = LinearGradient {
            angle_deg: grad.angle_deg,
            stops: grad
                .stops
                .iter()
                .map(|s| ShadingStop {
                    offset: s.position,
                    color: crate::style::Color { r: s.color[0], g: s.color[1], b: s.color[2], a: s.color[3] },
                })
                .collect(),
        };
        let shading = linear_gradient_to_shading(&gradient, lbox.width, lbox.height);
        // Shift the shading's box-local coordinates into this box's
        // page-space origin before registering it.
        let shading = crate::gradient::Shading { x0: x0 + shading.x0, y0: y0 + shading.y0, x1: x0 + shading.x1, y1: y0 + shading.y1, ..shading };
        let alias = builder.register_shading(page, &shading);
        out.push_str("q\n");
        append_rounded_rect_path(out, x0, y0, x1, y1, tl, tr, br, bl);
        out.push_str("W n\n");
        let _ = writeln!(out, "/{alias} sh");
        out.push_str("Q\n");
    } else if let Some(bg) = &lbox.background_color {
        if bg[3] > 0.001 {
            let _ = writeln!(out, "{:.3} {:.3} {:.3} rg", bg[0], bg[1], bg[2]);
            append_rounded_rect_path(out, x0, y0, x1, y1, tl, tr, br, bl);
            out.push_str("f\n");
        }
    }
}

/// Draws the border as the even-odd fill of the difference between the
/// outer rounded rect and one inset by the stroke width, rather than
/// stroking a centerline path — this keeps the painted edge exactly on the
/// border box instead of straddling it by half the stroke width.
fn paint_border(out: &mut String, lbox: &LayoutBox, x0: f32, y0: f32, x1: f32, y1: f32) {
    let Some(border) = &lbox.border else { return };
    let w = border.width;
    if w < 0.01 {
        return;
    }
    let (tl, tr, br, bl) = (lbox.border_radius[0], lbox.border_radius[1], lbox.border_radius[2], lbox.border_radius[3]);
    let _ = writeln!(out, "{:.3} {:.3} {:.3} rg", border.color[0], border.color[1], border.color[2]);
    append_rounded_rect_path(out, x0, y0, x1, y1, tl, tr, br, bl);
    let ix0 = x0 + w;
    let ix1 = (x1 - w).max(ix0);
    let iy0 = y0 + w;
    let iy1 = (y1 - w).max(iy0);
    append_rounded_rect_path(out, ix0, iy0, ix1, iy1, (tl - w).max(0.0), (tr - w).max(0.0), (br - w).max(0.0), (bl - w).max(0.0));
    out.push_str("f*\n");
}

fn paint_text(builder: &mut PdfBuilder, page: &PageHandle, fonts: &FontRegistry, out: &mut String, lbox: &LayoutBox, box_top_pdf_y: f32) {
    let Some(text) = &lbox.text else { return };
    let key = FontKey::new(&text.font_family, text.bold, text.italic);
    let font = fonts.resolve(&key);

    let base_font_name = base14_name(text.bold, text.italic);
    let (font_alias, use_embedded) = match font {
        Some(f) if !f.program.is_empty() => {
            let subset = f.build_subset().unwrap_or_else(|_| crate::fonts::subset::FontSubset {
                program: Vec::new(),
                gid_to_unicode: Default::default(),
                num_glyphs: 0,
            });
            let cache_key = format!("{}-{}-{}", f.key.family, f.key.bold, f.key.italic);
            (builder.register_embedded_font(page, &cache_key, &subset, &f.key.family), true)
        }
        _ => (builder.register_base14_font(page, base_font_name), false),
    };

    let _ = writeln!(out, "{:.3} {:.3} {:.3} rg", text.color[0], text.color[1], text.color[2]);

    // The baseline sits `ascender / unitsPerEm * fontSize` below the line's
    // top; fall back to the synthetic-metrics ratio when no font resolved.
    let ascent = font.map(|f| f.metrics.ascender_px(text.font_size)).unwrap_or(text.font_size * 0.8);

    for line in &text.lines {
        if line.text.is_empty() {
            continue;
        }
        let text_x = lbox.x + line.x_offset;
        let baseline_y = box_top_pdf_y - line.y_offset - ascent;
        paint_text_run(out, &font_alias, use_embedded, font, &line.text, text.font_size, text_x, baseline_y);

        if text.underline {
            let underline_y = baseline_y - text.font_size * 0.1;
            let _ = writeln!(out, "{:.3} {:.3} {:.3} RG {:.3} w", text.color[0], text.color[1], text.color[2], (text.font_size * 0.06).max(0.5));
            let _ = writeln!(out, "{text_x:.3} {underline_y:.3} m {:.3} {underline_y:.3} l S", lbox.x + lbox.width);
        }
    }

    if let Some(marker) = &text.list_marker {
        let marker_x = lbox.x - 16.0;
        let marker_y = box_top_pdf_y - ascent;
        paint_text_run(out, &font_alias, use_embedded, font, marker, text.font_size, marker_x, marker_y);
    }
}

/// Emits one line of shaped text. Embedded Type0 fonts carry `/DW 0` and no
/// `/W` array (this emitter never builds one), so every glyph's own declared
/// advance is zero; the `TJ` array's numeric adjustments are what actually
/// separates the glyphs, rather than being a kerning refinement layered on
/// top of real widths.
fn paint_text_run(out: &mut String, font_alias: &str, use_embedded: bool, font: Option<&LoadedFont>, text: &str, font_size: f32, x: f32, y: f32) {
    out.push_str("BT\n");
    let _ = writeln!(out, "/{font_alias} {font_size:.3} Tf");
    let _ = writeln!(out, "1 0 0 1 {x:.3} {y:.3} Tm");

    if use_embedded {
        let run = font.map(|f| shape_text(f, text, font_size, 0.0, 0.0));
        out.push_str("[");
        if let Some(run) = run {
            for glyph in &run.positions {
                let _ = write!(out, "<{:04X}>", glyph.glyph_id);
                let adjustment = -(glyph.advance / font_size * 1000.0);
                let _ = write!(out, " {adjustment:.3} ");
            }
        }
        out.push_str("] TJ\n");
    } else {
        let _ = writeln!(out, "<{}> Tj", winlatin_hex(text));
    }
    out.push_str("ET\n");
}

fn base14_name(bold: bool, italic: bool) -> &'static str {
    match (bold, italic) {
        (true, true) => "Helvetica-BoldOblique",
        (true, false) => "Helvetica-Bold",
        (false, true) => "Helvetica-Oblique",
        (false, false) => "Helvetica",
    }
}

/// Converts text to a PDF hex string (`<...>`) of raw Windows-1252 bytes —
/// one byte per glyph, matching the base-14 fonts' WinAnsiEncoding. A hex
/// string is used instead of a literal `(...)` string so every output byte
/// stays within plain ASCII hex digits regardless of what high-bit value it
/// encodes; the alternative (building a `String` out of raw Latin-1 bytes)
/// would not be valid UTF-8 and could not be safely inspected afterward.
fn winlatin_hex(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for c in s.chars() {
        let byte = match c {
            '\u{20AC}' => 0x80,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{00A0}' => 0x20,
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        };
        let _ = write!(out, "{byte:02X}");
    }
    out
}

fn paint_image(builder: &mut PdfBuilder, page: &PageHandle, env: &dyn Environment, cache: &mut ImageCache, out: &mut String, lbox: &LayoutBox, box_top_pdf_y: f32) {
    let Some(img) = &lbox.image else { return };

    if !cache.contains_key(&img.src) {
        let decoded = load_image(&img.src, env).ok();
        cache.insert(img.src.clone(), decoded);
    }
    let Some(Some(image)) = cache.get(&img.src) else {
        return;
    };

    let alias = builder.register_image(page, image);
    let img_bottom = box_top_pdf_y - lbox.height;
    let _ = writeln!(out, "q {:.3} 0 0 {:.3} {:.3} {:.3} cm /{alias} Do Q", lbox.width, lbox.height, lbox.x, img_bottom);
}

fn load_image(src: &str, env: &dyn Environment) -> Result<image::Image, PagecraftError> {
    let bytes = if let Some(rest) = src.strip_prefix("data:") {
        parse_data_uri(rest)?
    } else {
        env.read_binary(src)?
    };
    image::decode(&bytes)
}

fn parse_data_uri(rest: &str) -> Result<Vec<u8>, PagecraftError> {
    let comma_pos = rest.find(',').ok_or_else(|| PagecraftError::parse("data URI missing ',' separator"))?;
    let header = &rest[..comma_pos];
    if !header.contains(";base64") {
        return Err(PagecraftError::parse("only base64-encoded data URIs are supported"));
    }
    BASE64_STD.decode(rest[comma_pos + 1..].trim()).map_err(|e| PagecraftError::parse(format!("base64 decode error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::LocalEnvironment;
    use crate::layout_config::LayoutConfig;

    #[test]
    fn empty_document_paints_one_blank_page() {
        let config = LayoutConfig::a4();
        let mut fonts = FontRegistry::new();
        fonts.ensure_default();
        let bytes = paint(&config, &fonts, &LocalEnvironment, None).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Type /Catalog"));
    }

    #[test]
    fn rounded_rect_path_falls_back_to_straight_edges_when_radii_are_zero() {
        let mut out = String::new();
        append_rounded_rect_path(&mut out, 0.0, 0.0, 10.0, 10.0, 0.0, 0.0, 0.0, 0.0);
        assert!(!out.contains(" c"));
        assert!(out.trim_end().ends_with('h'));
    }

    #[test]
    fn rounded_rect_path_emits_bezier_curves_when_radii_present() {
        let mut out = String::new();
        append_rounded_rect_path(&mut out, 0.0, 0.0, 10.0, 10.0, 2.0, 2.0, 2.0, 2.0);
        assert!(out.contains(" c"));
    }
}
