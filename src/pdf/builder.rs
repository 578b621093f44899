//! High-level PDF document assembly: pages, fonts (Type0/CID embedded
//! TrueType subsets, Type1 base-14 fallback), image XObjects, ExtGStates,
//! and axial shadings, serialized in the order the spec mandates:
//! resources first, then per-page content/annotations/page dict, then the
//! Pages tree, then the Catalog, then (if present) Info.

use std::collections::HashMap;
use std::io::Write as _;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::environment::DateStamp;
use crate::fonts::subset::FontSubset;
use crate::gradient::Shading;
use crate::image::{Image, PassthroughJpeg};
use crate::pdf::object::{Dict, IdAllocator, ObjRef, Value};
use crate::pdf::resources::{fingerprint, PageResources};
use crate::pdf::writer::PdfWriter;

pub struct PageHandle(pub usize);

struct BuiltPage {
    obj_ref: ObjRef,
    width_pt: f32,
    height_pt: f32,
    content: Vec<u8>,
    resources: PageResources,
    annotations: Vec<Dict>,
}

/// A font object already written into the document graph: its alias (for
/// `/Font` resource dicts) and object reference, cached so the same logical
/// font is embedded at most once per render even if used on many pages.
#[derive(Clone)]
struct FontObject {
    obj_ref: ObjRef,
}

pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub producer: String,
    pub created: DateStamp,
}

pub struct PdfBuilder {
    ids: IdAllocator,
    catalog_ref: ObjRef,
    pages_tree_ref: ObjRef,
    pages: Vec<BuiltPage>,
    font_cache: HashMap<String, FontObject>,
    image_cache: HashMap<u64, (ObjRef, u32, u32)>,
    /// Resource objects reserved but not yet written; flushed in `finish`
    /// ahead of the pages tree, per the mandated serialization order.
    pending_streams: Vec<(ObjRef, Dict, Vec<u8>)>,
    pending_dicts: Vec<(ObjRef, Dict)>,
    pending_base14: HashMap<String, ObjRef>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut ids = IdAllocator::new();
        let catalog_ref = ids.alloc();
        let pages_tree_ref = ids.alloc();
        Self {
            ids,
            catalog_ref,
            pages_tree_ref,
            pages: Vec::new(),
            font_cache: HashMap::new(),
            image_cache: HashMap::new(),
            pending_streams: Vec::new(),
            pending_dicts: Vec::new(),
            pending_base14: HashMap::new(),
        }
    }

    pub fn add_page(&mut self, width_pt: f32, height_pt: f32) -> PageHandle {
        let obj_ref = self.ids.alloc();
        self.pages.push(BuiltPage {
            obj_ref,
            width_pt,
            height_pt,
            content: Vec::new(),
            resources: PageResources::new(),
            annotations: Vec::new(),
        });
        PageHandle(self.pages.len() - 1)
    }

    pub fn set_content(&mut self, page: &PageHandle, content: Vec<u8>) {
        self.pages[page.0].content = content;
    }

    pub fn add_annotation(&mut self, page: &PageHandle, dict: Dict) {
        self.pages[page.0].annotations.push(dict);
    }

    /// Registers (embedding if not already cached) a Type0/CID TrueType
    /// font for `subset`, returning the content-stream alias (e.g. `F1`).
    pub fn register_embedded_font(&mut self, page: &PageHandle, cache_key: &str, subset: &FontSubset, base_font_name: &str) -> String {
        let font_obj = if let Some(cached) = self.font_cache.get(cache_key) {
            cached.clone()
        } else {
            let obj_ref = self.write_type0_font(subset, base_font_name);
            let cached = FontObject { obj_ref };
            self.font_cache.insert(cache_key.to_string(), cached.clone());
            cached
        };
        self.pages[page.0].resources.fonts.register_at(cache_key, font_obj.obj_ref, fingerprint(cache_key.as_bytes()))
    }

    /// Registers a Type1 base-14 font (no embedding, no subsetting): the
    /// fallback path when no real font program is available.
    pub fn register_base14_font(&mut self, page: &PageHandle, base_font_name: &str) -> String {
        let font_obj = if let Some(cached) = self.font_cache.get(base_font_name) {
            cached.clone()
        } else {
            let obj_ref = self.ids.alloc();
            let cached = FontObject { obj_ref };
            self.font_cache.insert(base_font_name.to_string(), cached.clone());
            cached
        };
        // The object itself is deferred to `write_resources` via a pending
        // list keyed by cache name; base-14 fonts are cheap enough to just
        // stash the dict now and write it during finalize.
        self.pending_base14.entry(base_font_name.to_string()).or_insert_with(|| font_obj.obj_ref);
        self.pages[page.0].resources.fonts.register_at(base_font_name, font_obj.obj_ref, fingerprint(base_font_name.as_bytes()))
    }

    /// Registers a decoded raster image as an `/Image` XObject, deduping on
    /// pixel content so the same picture embedded on multiple pages is only
    /// written once.
    pub fn register_image(&mut self, page: &PageHandle, image: &Image) -> String {
        let (fp, width, height) = match image {
            Image::Raster(d) => (fingerprint(&d.rgba), d.width, d.height),
            Image::Jpeg(j) => (fingerprint(&j.data), j.width, j.height),
        };
        let obj_ref = if let Some((cached, _, _)) = self.image_cache.get(&fp) {
            *cached
        } else {
            let obj_ref = self.write_image_object(image);
            self.image_cache.insert(fp, (obj_ref, width, height));
            obj_ref
        };
        self.pages[page.0].resources.xobjects.register_at(format!("Im{fp:x}"), obj_ref, fp)
    }

    pub fn register_ext_gstate(&mut self, page: &PageHandle, fill_alpha: f32, stroke_alpha: f32) -> String {
        let dict = Dict::new().set("Type", Value::Name("ExtGState".into())).set("ca", fill_alpha).set("CA", stroke_alpha);
        let obj_ref = self.ids.alloc();
        self.pending_dicts.push((obj_ref, dict));
        let fp = fingerprint(format!("{fill_alpha}:{stroke_alpha}").as_bytes());
        self.pages[page.0].resources.ext_gstates.register_at(format!("GS{fp:x}"), obj_ref, fp)
    }

    pub fn register_shading(&mut self, page: &PageHandle, shading: &Shading) -> String {
        let dict = Dict::new()
            .set("ShadingType", 2i64)
            .set_name("ColorSpace", "DeviceRGB")
            .set_array("Coords", vec![shading.x0.into(), shading.y0.into(), shading.x1.into(), shading.y1.into()])
            .set_dict(
                "Function",
                Dict::new()
                    .set("FunctionType", 2i64)
                    .set_array("Domain", vec![0.0.into(), 1.0.into()])
                    .set_array("C0", vec![shading.c0[0].into(), shading.c0[1].into(), shading.c0[2].into()])
                    .set_array("C1", vec![shading.c1[0].into(), shading.c1[1].into(), shading.c1[2].into()])
                    .set("N", 1i64),
            )
            .set_array("Extend", vec![shading.extend_start.into(), shading.extend_end.into()]);
        let obj_ref = self.ids.alloc();
        let fp = fingerprint(format!("{:?}", (shading.x0, shading.y0, shading.x1, shading.y1, shading.c0, shading.c1)).as_bytes());
        self.pending_dicts.push((obj_ref, dict));
        self.pages[page.0].resources.shadings.register_at(format!("Sh{fp:x}"), obj_ref, fp)
    }

    fn write_type0_font(&mut self, subset: &FontSubset, base_font_name: &str) -> ObjRef {
        let file_ref = self.ids.alloc();
        let compressed = flate_compress(&subset.program);
        self.pending_streams.push((
            file_ref,
            Dict::new().set_name("Filter", "FlateDecode").set("Length1", subset.program.len() as i64),
            compressed,
        ));

        let descriptor_ref = self.ids.alloc();
        self.pending_dicts.push((
            descriptor_ref,
            Dict::new()
                .set("Type", Value::Name("FontDescriptor".into()))
                .set_name("FontName", base_font_name)
                .set("Flags", 32i64)
                .set("ItalicAngle", 0i64)
                .set("Ascent", 1000i64)
                .set("Descent", -200i64)
                .set("CapHeight", 700i64)
                .set("StemV", 80i64)
                .set("FontFile2", file_ref),
        ));

        let descendant_ref = self.ids.alloc();
        self.pending_dicts.push((
            descendant_ref,
            Dict::new()
                .set("Type", Value::Name("Font".into()))
                .set_name("Subtype", "CIDFontType2")
                .set_name("BaseFont", base_font_name)
                .set_dict("CIDSystemInfo", Dict::new().set("Registry", Value::LiteralString("Adobe".into())).set("Ordering", Value::LiteralString("Identity".into())).set("Supplement", 0i64))
                .set("FontDescriptor", descriptor_ref)
                .set("DW", 0i64)
                .set_name("CIDToGIDMap", "Identity"),
        ));

        let to_unicode_ref = self.ids.alloc();
        let cmap_stream = build_to_unicode_cmap(subset);
        self.pending_streams.push((to_unicode_ref, Dict::new().set_name("Filter", "FlateDecode"), flate_compress(&cmap_stream)));

        let font_ref = self.ids.alloc();
        self.pending_dicts.push((
            font_ref,
            Dict::new()
                .set("Type", Value::Name("Font".into()))
                .set_name("Subtype", "Type0")
                .set_name("BaseFont", base_font_name)
                .set_name("Encoding", "Identity-H")
                .set_array("DescendantFonts", vec![Value::Ref(descendant_ref)])
                .set("ToUnicode", to_unicode_ref),
        ));
        font_ref
    }

    fn write_image_object(&mut self, image: &Image) -> ObjRef {
        match image {
            Image::Raster(d) => {
                let obj_ref = self.ids.alloc();
                let rgb: Vec<u8> = d.rgba.chunks_exact(4).flat_map(|p| [p[0], p[1], p[2]]).collect();
                let mut dict = Dict::new()
                    .set("Type", Value::Name("XObject".into()))
                    .set_name("Subtype", "Image")
                    .set("Width", d.width as i64)
                    .set("Height", d.height as i64)
                    .set_name("ColorSpace", "DeviceRGB")
                    .set("BitsPerComponent", 8i64)
                    .set_name("Filter", "FlateDecode");
                if d.has_alpha {
                    let smask_ref = self.ids.alloc();
                    let alpha: Vec<u8> = d.rgba.chunks_exact(4).map(|p| p[3]).collect();
                    self.pending_streams.push((
                        smask_ref,
                        Dict::new()
                            .set("Type", Value::Name("XObject".into()))
                            .set_name("Subtype", "Image")
                            .set("Width", d.width as i64)
                            .set("Height", d.height as i64)
                            .set_name("ColorSpace", "DeviceGray")
                            .set("BitsPerComponent", 8i64)
                            .set_name("Filter", "FlateDecode"),
                        flate_compress(&alpha),
                    ));
                    dict = dict.set("SMask", smask_ref);
                }
                self.pending_streams.push((obj_ref, dict, flate_compress(&rgb)));
                obj_ref
            }
            Image::Jpeg(j) => self.write_jpeg_object(j),
        }
    }

    fn write_jpeg_object(&mut self, jpeg: &PassthroughJpeg) -> ObjRef {
        let obj_ref = self.ids.alloc();
        let color_space = if jpeg.num_components == 1 { "DeviceGray" } else { "DeviceRGB" };
        let dict = Dict::new()
            .set("Type", Value::Name("XObject".into()))
            .set_name("Subtype", "Image")
            .set("Width", jpeg.width as i64)
            .set("Height", jpeg.height as i64)
            .set_name("ColorSpace", color_space)
            .set("BitsPerComponent", 8i64)
            .set_name("Filter", "DCTDecode");
        self.pending_streams.push((obj_ref, dict, jpeg.data.clone()));
        obj_ref
    }

    pub fn finish(mut self, metadata: Option<DocumentMetadata>) -> Vec<u8> {
        let mut writer = PdfWriter::new();

        for (id, dict, data) in std::mem::take(&mut self.pending_streams) {
            writer.write_stream_object(id, dict, &data);
        }
        for (id, dict) in std::mem::take(&mut self.pending_dicts) {
            writer.write_dict_object(id, &dict);
        }
        for (name, obj_ref) in std::mem::take(&mut self.pending_base14) {
            let dict = Dict::new().set("Type", Value::Name("Font".into())).set_name("Subtype", "Type1").set_name("BaseFont", name);
            writer.write_dict_object(obj_ref, &dict);
        }

        let info_ref = metadata.as_ref().map(|_| self.ids.alloc());

        let mut page_refs = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            page_refs.push(page.obj_ref);
            let content_ref = self.ids.alloc();
            let compressed = flate_compress(&page.content);
            if !compressed.is_empty() {
                writer.write_stream_object(content_ref, Dict::new().set_name("Filter", "FlateDecode"), &compressed);
            }

            let mut page_dict = Dict::new()
                .set("Type", Value::Name("Page".into()))
                .set("Parent", self.pages_tree_ref)
                .set_array("MediaBox", vec![0.0.into(), 0.0.into(), page.width_pt.into(), page.height_pt.into()])
                .set_dict("Resources", page.resources.to_dict());
            if !compressed.is_empty() {
                page_dict = page_dict.set("Contents", content_ref);
            }
            if !page.annotations.is_empty() {
                page_dict = page_dict.set_array("Annots", page.annotations.iter().cloned().map(Value::Dict).collect());
            }
            writer.write_dict_object(page.obj_ref, &page_dict);
        }

        let kids: Vec<Value> = page_refs.iter().map(|r| Value::Ref(*r)).collect();
        let pages_dict = Dict::new()
            .set("Type", Value::Name("Pages".into()))
            .set_array("Kids", kids)
            .set("Count", page_refs.len() as i64);
        writer.write_dict_object(self.pages_tree_ref, &pages_dict);

        let catalog_dict = Dict::new().set("Type", Value::Name("Catalog".into())).set("Pages", self.pages_tree_ref);
        writer.write_dict_object(self.catalog_ref, &catalog_dict);

        if let (Some(meta), Some(info_ref)) = (&metadata, info_ref) {
            let mut info_dict = Dict::new();
            if let Some(title) = &meta.title {
                info_dict = info_dict.set("Title", Value::LiteralString(title.clone()));
            }
            if let Some(author) = &meta.author {
                info_dict = info_dict.set("Author", Value::LiteralString(author.clone()));
            }
            if let Some(subject) = &meta.subject {
                info_dict = info_dict.set("Subject", Value::LiteralString(subject.clone()));
            }
            if let Some(keywords) = &meta.keywords {
                info_dict = info_dict.set("Keywords", Value::LiteralString(keywords.clone()));
            }
            info_dict = info_dict.set("Producer", Value::LiteralString(meta.producer.clone()));
            info_dict = info_dict.set("CreationDate", Value::LiteralString(pdf_date(meta.created)));
            writer.write_dict_object(info_ref, &info_dict);
        }

        writer.finish(&self.ids, self.catalog_ref, info_ref)
    }
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn flate_compress(data: &[u8]) -> Vec<u8> {
    if data.is_empty() {
        return Vec::new();
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("in-memory zlib write cannot fail");
    encoder.finish().expect("in-memory zlib finish cannot fail")
}

fn build_to_unicode_cmap(subset: &FontSubset) -> Vec<u8> {
    let mut body = String::new();
    body.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
    body.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    body.push_str("/CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");
    body.push_str(&format!("{} beginbfchar\n", subset.gid_to_unicode.len().max(1)));
    if subset.gid_to_unicode.is_empty() {
        body.push_str("<0000> <0000>\n");
    }
    for (gid, ch) in &subset.gid_to_unicode {
        body.push_str(&format!("<{:04X}> <{:04X}>\n", gid, *ch as u32));
    }
    body.push_str("endbfchar\nendcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    body.into_bytes()
}

fn pdf_date(stamp: DateStamp) -> String {
    // Minimal `D:YYYYMMDDHHmmSS` rendering from a Unix timestamp, UTC.
    let secs = stamp.0.max(0) as u64;
    let time_of_day = secs % 86_400;
    let (h, m, s) = (time_of_day / 3600, (time_of_day % 3600) / 60, time_of_day % 60);
    let (y, mo, d) = stamp.ymd();
    format!("D:{y:04}{mo:02}{d:02}{h:02}{m:02}{s:02}Z")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_document_has_expected_skeleton() {
        let mut builder = PdfBuilder::new();
        let page = builder.add_page(100.0, 100.0);
        builder.set_content(&page, Vec::new());
        let bytes = builder.finish(None);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("/Type /Catalog"));
        assert!(text.contains("/Type /Pages"));
    }

    #[test]
    fn epoch_date_formats_as_1970() {
        assert_eq!(pdf_date(DateStamp(0)), "D:19700101000000Z");
    }
}
