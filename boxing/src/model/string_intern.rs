//! String interning for declaration names
//!
//! Names are compared constantly during refined-member lookup, so they are
//! stored once and referred to by an [`InternedString`] id. Comparison is a
//! `u32` comparison.

use fxhash::FxHashMap;
use std::rc::Rc;

/// An interned string represented as a unique ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InternedString(u32);

impl InternedString {
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

/// Deduplicating string store
#[derive(Debug, Default, Clone)]
pub struct StringInterner {
    strings: Vec<Rc<str>>,
    lookup: FxHashMap<Rc<str>, InternedString>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `s`, returning the existing id if it was seen before
    pub fn intern(&mut self, s: &str) -> InternedString {
        if let Some(&id) = self.lookup.get(s) {
            return id;
        }
        let id = InternedString(self.strings.len() as u32);
        let stored: Rc<str> = Rc::from(s);
        self.strings.push(Rc::clone(&stored));
        self.lookup.insert(stored, id);
        id
    }

    pub fn get(&self, id: InternedString) -> Option<&str> {
        self.strings.get(id.0 as usize).map(|s| &**s)
    }

    /// Resolve `id`, falling back to a placeholder for display purposes
    pub fn resolve(&self, id: InternedString) -> &str {
        self.get(id).unwrap_or("<unknown>")
    }

    /// Id of `s` if it has already been interned
    pub fn get_id(&self, s: &str) -> Option<InternedString> {
        self.lookup.get(s).copied()
    }

    pub fn contains(&self, s: &str) -> bool {
        self.lookup.contains_key(s)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
