//! The PDF object model: object references, lazily-assigned object numbers,
//! and a small `Value`/`Dict` tree used to serialize every dictionary the
//! emitter produces. Grounded on `pediferrous-pdfgen`'s `ObjId`/`IdManager`
//! pattern (object numbers are allocated from a single counter and are
//! stable once handed out, even though the object's *content* may be
//! finalized much later).

use std::fmt::Write as _;

/// `{object number, generation}`. Generation is always 0 — this emitter
/// never produces incremental updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef {
    pub number: u32,
    pub generation: u16,
}

impl ObjRef {
    pub fn indirect(&self, out: &mut String) {
        let _ = write!(out, "{} {} R", self.number, self.generation);
    }
}

/// Hands out object numbers starting at 1 (object number 0 is reserved for
/// the free-list head in the xref table). Numbers are assigned lazily —
/// callers may reserve a number before the object's content exists — but
/// once returned a number is never reused within the same render.
#[derive(Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn alloc(&mut self) -> ObjRef {
        let number = self.next;
        self.next += 1;
        ObjRef { number, generation: 0 }
    }

    /// `/Size` in the trailer: one past the highest object number handed
    /// out.
    pub fn size(&self) -> u32 {
        self.next
    }
}

/// A PDF value: enough of the object grammar to express every dictionary
/// this emitter builds (catalog, pages, fonts, images, shadings,
/// ExtGStates, annotations).
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    /// A PDF name, without its leading `/` (added at serialization time).
    Name(String),
    /// A literal string, written as `(...)` with minimal escaping.
    LiteralString(String),
    /// A hex string, written as `<...>`.
    HexString(Vec<u8>),
    Array(Vec<Value>),
    Dict(Dict),
    Ref(ObjRef),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}
impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(v as f64)
    }
}
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
impl From<ObjRef> for Value {
    fn from(v: ObjRef) -> Self {
        Value::Ref(v)
    }
}

/// An ordered dictionary (`<< /Key value ... >>`). Insertion order is
/// preserved and reproduced in the serialized bytes, so output is
/// deterministic for identical inputs.
#[derive(Debug, Clone, Default)]
pub struct Dict {
    entries: Vec<(String, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    pub fn set_name(mut self, key: impl Into<String>, name: impl Into<String>) -> Self {
        self.entries.push((key.into(), Value::Name(name.into())));
        self
    }

    pub fn set_array(mut self, key: impl Into<String>, values: Vec<Value>) -> Self {
        self.entries.push((key.into(), Value::Array(values)));
        self
    }

    pub fn set_dict(mut self, key: impl Into<String>, dict: Dict) -> Self {
        self.entries.push((key.into(), Value::Dict(dict)));
        self
    }

    pub fn merge(mut self, other: Dict) -> Self {
        self.entries.extend(other.entries);
        self
    }
}

pub fn serialize_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Real(r) => {
            let _ = write!(out, "{:.6}", r);
        }
        Value::Name(n) => {
            out.push('/');
            out.push_str(n);
        }
        Value::LiteralString(s) => {
            out.push('(');
            for c in s.chars() {
                match c {
                    '(' => out.push_str("\\("),
                    ')' => out.push_str("\\)"),
                    '\\' => out.push_str("\\\\"),
                    _ => out.push(c),
                }
            }
            out.push(')');
        }
        Value::HexString(bytes) => {
            out.push('<');
            for b in bytes {
                let _ = write!(out, "{:02X}", b);
            }
            out.push('>');
        }
        Value::Array(values) => {
            out.push('[');
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                serialize_value(v, out);
            }
            out.push(']');
        }
        Value::Dict(dict) => serialize_dict(dict, out),
        Value::Ref(r) => r.indirect(out),
    }
}

pub fn serialize_dict(dict: &Dict, out: &mut String) {
    out.push_str("<< ");
    for (key, value) in &dict.entries {
        out.push('/');
        out.push_str(key);
        out.push(' ');
        serialize_value(value, out);
        out.push(' ');
    }
    out.push_str(">>");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_starts_at_one_and_increments() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.alloc().number, 1);
        assert_eq!(ids.alloc().number, 2);
        assert_eq!(ids.size(), 3);
    }

    #[test]
    fn dict_serializes_in_insertion_order() {
        let dict = Dict::new().set_name("Type", "Page").set("Count", 3i64);
        let mut out = String::new();
        serialize_dict(&dict, &mut out);
        assert_eq!(out, "<< /Type /Page /Count 3 >>");
    }

    #[test]
    fn ref_serializes_as_indirect_reference() {
        let r = ObjRef { number: 5, generation: 0 };
        let mut out = String::new();
        r.indirect(&mut out);
        assert_eq!(out, "5 0 R");
    }
}
