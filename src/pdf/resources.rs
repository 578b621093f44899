//! Per-page resource dictionaries: fonts, XObjects (images), ExtGStates,
//! shadings, and patterns, each keyed by the short alias used in content
//! stream operators (`/F1`, `/Im1`, `/GS1`, `/Sh1`). A registry returns a
//! stable alias + object reference on first insertion; registering the same
//! alias again with different content is a `PdfInvariantViolation`.

use std::collections::HashMap;

use crate::error::invariant_violation;
use crate::pdf::object::{Dict, ObjRef, Value};

/// One named resource: the alias it's addressed by in content streams, the
/// object reference it resolves to, and a fingerprint of the data that
/// produced it (used only to detect alias collisions with different
/// content).
struct Entry {
    obj_ref: ObjRef,
    fingerprint: u64,
}

#[derive(Default)]
pub struct ResourceCategory {
    prefix: &'static str,
    entries: HashMap<String, Entry>,
    next_index: u32,
}

impl ResourceCategory {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, entries: HashMap::new(), next_index: 1 }
    }

    /// Registers a resource under a freshly allocated alias (e.g. `F3`),
    /// returning that alias and its object reference.
    pub fn register(&mut self, obj_ref: ObjRef, fingerprint: u64) -> String {
        let alias = format!("{}{}", self.prefix, self.next_index);
        self.next_index += 1;
        self.entries.insert(alias.clone(), Entry { obj_ref, fingerprint });
        alias
    }

    /// Registers a resource under an explicit, caller-chosen alias (used for
    /// fonts and images so the same logical resource reuses one alias
    /// across repeated insertions within a page). Panics if `alias` is
    /// already bound to different content — a
    /// `PdfInvariantViolation`-class bug, never a recoverable condition.
    pub fn register_at(&mut self, alias: impl Into<String>, obj_ref: ObjRef, fingerprint: u64) -> String {
        let alias = alias.into();
        if let Some(existing) = self.entries.get(&alias) {
            if existing.fingerprint != fingerprint {
                invariant_violation(
                    obj_ref.number,
                    &format!("resource alias '{alias}' registered twice with different content"),
                );
            }
            return alias;
        }
        self.entries.insert(alias.clone(), Entry { obj_ref, fingerprint });
        alias
    }

    pub fn get(&self, alias: &str) -> Option<ObjRef> {
        self.entries.get(alias).map(|e| e.obj_ref)
    }

    fn to_dict(&self) -> Dict {
        let mut dict = Dict::new();
        for (alias, entry) in &self.entries {
            dict = dict.set(alias.clone(), Value::Ref(entry.obj_ref));
        }
        dict
    }
}

/// The full `/Resources` dictionary for one page: `/Font`, `/XObject`,
/// `/ExtGState`, `/Shading`, `/Pattern` sub-dictionaries.
#[derive(Default)]
pub struct PageResources {
    pub fonts: ResourceCategory,
    pub xobjects: ResourceCategory,
    pub ext_gstates: ResourceCategory,
    pub shadings: ResourceCategory,
    pub patterns: ResourceCategory,
}

impl PageResources {
    pub fn new() -> Self {
        Self {
            fonts: ResourceCategory::new("F"),
            xobjects: ResourceCategory::new("Im"),
            ext_gstates: ResourceCategory::new("GS"),
            shadings: ResourceCategory::new("Sh"),
            patterns: ResourceCategory::new("P"),
        }
    }

    pub fn to_dict(&self) -> Dict {
        let mut dict = Dict::new();
        dict = dict.set_dict("Font", self.fonts.to_dict());
        dict = dict.set_dict("XObject", self.xobjects.to_dict());
        dict = dict.set_dict("ExtGState", self.ext_gstates.to_dict());
        dict = dict.set_dict("Shading", self.shadings.to_dict());
        dict = dict.set_dict("Pattern", self.patterns.to_dict());
        dict
    }
}

/// A cheap order-independent-enough fingerprint for collision detection —
/// not cryptographic, just good enough to tell "same bytes" from "different
/// bytes" for the same alias within one render.
pub fn fingerprint(data: &[u8]) -> u64 {
    // FNV-1a.
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in data {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::object::IdAllocator;

    #[test]
    fn register_at_is_idempotent_for_identical_content() {
        let mut ids = IdAllocator::new();
        let mut cat = ResourceCategory::new("F");
        let r = ids.alloc();
        let a1 = cat.register_at("F1", r, fingerprint(b"same"));
        let a2 = cat.register_at("F1", r, fingerprint(b"same"));
        assert_eq!(a1, a2);
    }

    #[test]
    #[should_panic(expected = "registered twice with different content")]
    fn register_at_panics_on_alias_collision() {
        let mut ids = IdAllocator::new();
        let mut cat = ResourceCategory::new("F");
        let r1 = ids.alloc();
        cat.register_at("F1", r1, fingerprint(b"one"));
        let r2 = ids.alloc();
        cat.register_at("F1", r2, fingerprint(b"two"));
    }
}
