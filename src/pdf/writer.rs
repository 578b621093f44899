//! Low-level byte writer: header, `<N> 0 obj ... endobj` framing (recording
//! the exact byte offset of each header, as the xref table requires), and
//! final xref table + trailer + `startxref` + `%%EOF` assembly. Grounded on
//! `pediferrous-pdfgen`'s `PdfWriter` (`write_header`/`write_object`/
//! `write_crt`/`write_trailer`/`write_eof`), generalized to track offsets in
//! a `BTreeMap` instead of assuming objects are written in ascending id
//! order (this emitter may reserve a number before its object's content is
//! ready).

use std::collections::BTreeMap;

use crate::error::invariant_violation;
use crate::pdf::object::{serialize_dict, Dict, IdAllocator, ObjRef};

pub struct PdfWriter {
    buf: Vec<u8>,
    offsets: BTreeMap<u32, usize>,
}

impl PdfWriter {
    pub fn new() -> Self {
        let mut w = Self { buf: Vec::new(), offsets: BTreeMap::new() };
        w.write_header();
        w
    }

    fn write_header(&mut self) {
        self.buf.extend_from_slice(b"%PDF-1.4\n");
        // Binary marker comment: four bytes >= 0x80 so downstream FTP/mail
        // transports that sniff for "looks like text" treat the file as
        // binary, matching common PDF producer convention.
        self.buf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
    }

    /// Writes a dictionary-only object (`<< ... >>`), recording its offset.
    pub fn write_dict_object(&mut self, id: ObjRef, dict: &Dict) {
        self.begin_object(id);
        let mut s = String::new();
        serialize_dict(dict, &mut s);
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(b'\n');
        self.end_object();
    }

    /// Writes a stream object: the dict must not include `/Length` — it is
    /// computed and inserted here. Never called with empty `data`; callers
    /// must skip zero-length streams entirely per the emitter's contract.
    pub fn write_stream_object(&mut self, id: ObjRef, dict: Dict, data: &[u8]) {
        if data.is_empty() {
            invariant_violation(id.number, "attempted to emit a zero-length stream body");
        }
        let dict = dict.set("Length", data.len() as i64);
        self.begin_object(id);
        let mut s = String::new();
        serialize_dict(&dict, &mut s);
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.extend_from_slice(b"\nstream\n");
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\n");
        self.end_object();
    }

    fn begin_object(&mut self, id: ObjRef) {
        if self.offsets.contains_key(&id.number) {
            invariant_violation(id.number, "object number written more than once");
        }
        self.offsets.insert(id.number, self.buf.len());
        self.buf.extend_from_slice(format!("{} {} obj\n", id.number, id.generation).as_bytes());
    }

    fn end_object(&mut self) {
        self.buf.extend_from_slice(b"endobj\n");
    }

    /// Writes the xref table, trailer, `startxref`, and `%%EOF`, then
    /// returns the finished byte stream. `allocator` must reflect every
    /// object number referenced anywhere in the document; any number with
    /// no recorded offset is a dangling reference and panics.
    pub fn finish(mut self, allocator: &IdAllocator, root: ObjRef, info: Option<ObjRef>) -> Vec<u8> {
        let size = allocator.size();
        for n in 1..size {
            if !self.offsets.contains_key(&n) {
                invariant_violation(n, "object number reserved but never written (dangling reference)");
            }
        }

        let xref_offset = self.buf.len();
        self.buf.extend_from_slice(b"xref\n");
        self.buf.extend_from_slice(format!("0 {size}\n").as_bytes());
        self.buf.extend_from_slice(b"0000000000 65535 f \n");
        for n in 1..size {
            let offset = self.offsets[&n];
            self.buf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }

        let mut trailer = Dict::new().set("Size", size as i64).set("Root", root);
        if let Some(info) = info {
            trailer = trailer.set("Info", info);
        }
        self.buf.extend_from_slice(b"trailer\n");
        let mut s = String::new();
        serialize_dict(&trailer, &mut s);
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(b'\n');

        self.buf.extend_from_slice(b"startxref\n");
        self.buf.extend_from_slice(format!("{xref_offset}\n").as_bytes());
        self.buf.extend_from_slice(b"%%EOF\n");

        self.buf
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xref_entries_point_at_exact_obj_headers() {
        let mut ids = IdAllocator::new();
        let mut w = PdfWriter::new();
        let a = ids.alloc();
        let b = ids.alloc();
        w.write_dict_object(a, &Dict::new().set_name("Type", "Catalog"));
        w.write_dict_object(b, &Dict::new().set_name("Type", "Pages"));
        let bytes = w.finish(&ids, a, None);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.trim_end().ends_with("%%EOF"));

        let xref_line = text.lines().find(|l| l.starts_with("0 3")).unwrap();
        assert_eq!(xref_line, "0 3");

        // Locate object 1's recorded offset and confirm it points at "1 0 obj".
        let offset_line_idx = text.lines().position(|l| l.starts_with("0 3")).unwrap() + 2;
        let offset: usize = text.lines().nth(offset_line_idx).unwrap()[..10].parse().unwrap();
        assert_eq!(&text.as_bytes()[offset..offset + 7], b"1 0 obj");
    }

    #[test]
    #[should_panic(expected = "zero-length stream body")]
    fn refuses_to_emit_empty_stream() {
        let mut ids = IdAllocator::new();
        let mut w = PdfWriter::new();
        let id = ids.alloc();
        w.write_stream_object(id, Dict::new(), &[]);
    }

    #[test]
    #[should_panic(expected = "reserved but never written")]
    fn dangling_reference_panics_on_finish() {
        let mut ids = IdAllocator::new();
        let w = PdfWriter::new();
        let root = ids.alloc();
        let _unwritten = ids.alloc();
        w.finish(&ids, root, None);
    }
}
