//! Open-addressing hash map keyed by interned strings.
//!
//! Linear probing with tombstones. Because every key is interned, the
//! probe loop compares keys by [`StrId`] identity; content comparison
//! happens only in [`Table::find_string`], the interning lookup. Key
//! hashes live on the string objects, so operations that need one take the
//! heap's object arena as a read-only argument.

use crate::object::{ObjString, StrId};
use crate::value::Value;

/// Grow when `count / capacity` would pass this load factor.
const MAX_LOAD: f64 = 0.75;

/// Initial capacity of a table's first allocation.
const INITIAL_CAPACITY: usize = 8;

/// One bucket. An empty slot is `(None, Nil)`; a tombstone left by a
/// deletion is `(None, Bool(true))` so probe chains stay intact.
#[derive(Clone, Copy)]
struct Entry {
    key: Option<StrId>,
    value: Value,
}

impl Entry {
    const EMPTY: Entry = Entry {
        key: None,
        value: Value::Nil,
    };

    const TOMBSTONE: Entry = Entry {
        key: None,
        value: Value::Bool(true),
    };

    #[inline]
    fn is_tombstone(&self) -> bool {
        self.key.is_none() && self.value == Value::Bool(true)
    }
}

/// An open-addressing hash map from interned string to [`Value`].
///
/// `count` includes tombstones; it is rebuilt to the live total whenever
/// the capacity is adjusted.
pub struct Table {
    entries: Vec<Entry>,
    count: usize,
}

impl Table {
    /// Creates an empty table. No allocation happens until the first
    /// insertion.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            count: 0,
        }
    }

    /// Number of occupied slots, tombstones included.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Current bucket capacity.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Locates the bucket for `key`: either the bucket holding it, or the
    /// first reusable bucket (preferring a passed tombstone) where an
    /// insertion would go.
    ///
    /// Requires a non-empty `entries` slice; termination is guaranteed by
    /// the load factor keeping at least one truly empty slot.
    fn find_entry(entries: &[Entry], key: StrId, hash: u32) -> usize {
        let capacity = entries.len();
        let mut index = hash as usize % capacity;
        let mut tombstone: Option<usize> = None;

        loop {
            let entry = &entries[index];
            match entry.key {
                Some(k) if k == key => return index,
                Some(_) => {},
                None => {
                    if entry.is_tombstone() {
                        tombstone.get_or_insert(index);
                    } else {
                        return tombstone.unwrap_or(index);
                    }
                },
            }

            index = (index + 1) % capacity;
        }
    }

    /// Looks up `key`, returning its value if present.
    pub fn get(&self, key: StrId, strings: &[ObjString]) -> Option<Value> {
        if self.count == 0 {
            return None;
        }

        let hash = strings[key.index()].hash();
        let entry = &self.entries[Self::find_entry(&self.entries, key, hash)];
        entry.key.map(|_| entry.value)
    }

    /// Inserts or overwrites `key`. Returns true when the key was not
    /// already present.
    pub fn set(&mut self, key: StrId, value: Value, strings: &[ObjString]) -> bool {
        if (self.count + 1) as f64 > self.entries.len() as f64 * MAX_LOAD {
            let capacity = if self.entries.is_empty() {
                INITIAL_CAPACITY
            } else {
                self.entries.len() * 2
            };
            self.adjust_capacity(capacity, strings);
        }

        let hash = strings[key.index()].hash();
        let index = Self::find_entry(&self.entries, key, hash);
        let entry = &mut self.entries[index];

        let is_new = entry.key.is_none();
        // A reclaimed tombstone is already counted.
        if is_new && !entry.is_tombstone() {
            self.count += 1;
        }

        entry.key = Some(key);
        entry.value = value;
        is_new
    }

    /// Removes `key`, leaving a tombstone. Returns whether the key was
    /// present. `count` is not decremented; tombstones are reclaimed only
    /// when the capacity is adjusted.
    pub fn delete(&mut self, key: StrId, strings: &[ObjString]) -> bool {
        if self.count == 0 {
            return false;
        }

        let hash = strings[key.index()].hash();
        let index = Self::find_entry(&self.entries, key, hash);
        if self.entries[index].key.is_none() {
            return false;
        }

        self.entries[index] = Entry::TOMBSTONE;
        true
    }

    /// Copies every live entry of `from` into this table.
    pub fn add_all(&mut self, from: &Table, strings: &[ObjString]) {
        for entry in &from.entries {
            if let Some(key) = entry.key {
                self.set(key, entry.value, strings);
            }
        }
    }

    /// Interning lookup: finds the id of a stored key whose contents equal
    /// `chars`. This is the only content-comparing probe.
    pub fn find_string(&self, objects: &[ObjString], chars: &str, hash: u32) -> Option<StrId> {
        if self.count == 0 {
            return None;
        }

        let capacity = self.entries.len();
        let mut index = hash as usize % capacity;

        loop {
            let entry = &self.entries[index];
            match entry.key {
                None => {
                    // Stop at a truly empty slot; skip over tombstones.
                    if !entry.is_tombstone() {
                        return None;
                    }
                },
                Some(key) => {
                    let string = &objects[key.index()];
                    if string.hash() == hash && string.chars() == chars {
                        return Some(key);
                    }
                },
            }

            index = (index + 1) % capacity;
        }
    }

    /// Rebuilds the table at `capacity`, rehashing live entries and
    /// discarding tombstones. `count` becomes the live total.
    fn adjust_capacity(&mut self, capacity: usize, strings: &[ObjString]) {
        let mut entries = vec![Entry::EMPTY; capacity];
        let mut count = 0;

        for entry in &self.entries {
            if let Some(key) = entry.key {
                let hash = strings[key.index()].hash();
                let index = Self::find_entry(&entries, key, hash);
                entries[index] = *entry;
                count += 1;
            }
        }

        self.entries = entries;
        self.count = count;
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}
