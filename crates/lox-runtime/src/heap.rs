//! The object heap: an arena of interned strings.

use crate::object::{hash_string, ObjString, StrId};
use crate::table::Table;
use crate::value::{Value, ValueDisplay};

/// Owns every heap object in the system.
///
/// Objects live in an arena addressed by [`StrId`]; the dedicated
/// `strings` table (a set: every value is `Nil`) guarantees that no two
/// distinct objects have equal contents. Tables elsewhere store only
/// `StrId`s, so the arena is the single owner and dropping the heap frees
/// everything at once.
pub struct Heap {
    objects: Vec<ObjString>,
    strings: Table,
}

impl Heap {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            strings: Table::new(),
        }
    }

    /// Interns `chars`, returning the canonical id for its contents.
    ///
    /// When an equal string is already present its id is returned and
    /// nothing is allocated; otherwise the string is copied into the arena
    /// and recorded in the intern table.
    pub fn intern(&mut self, chars: &str) -> StrId {
        let hash = hash_string(chars);
        if let Some(existing) = self.strings.find_string(&self.objects, chars, hash) {
            return existing;
        }

        let id = StrId(self.objects.len() as u32);
        self.objects.push(ObjString::new(chars.into(), hash));
        self.strings.set(id, Value::Nil, &self.objects);
        id
    }

    /// Concatenates two interned strings, interning the result.
    pub fn concat(&mut self, a: StrId, b: StrId) -> StrId {
        let mut chars = String::with_capacity(self.chars(a).len() + self.chars(b).len());
        chars.push_str(self.chars(a));
        chars.push_str(self.chars(b));
        self.intern(&chars)
    }

    /// The character contents for `id`.
    #[inline]
    pub fn chars(&self, id: StrId) -> &str {
        self.objects[id.index()].chars()
    }

    /// The object arena, for table operations that resolve key hashes.
    #[inline]
    pub fn objects(&self) -> &[ObjString] {
        &self.objects
    }

    /// Number of live heap objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Canonical display form of `value`, resolved against this heap.
    pub fn display(&self, value: Value) -> ValueDisplay<'_> {
        ValueDisplay { value, heap: self }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
