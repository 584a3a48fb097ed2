//! Insertion-ordered records with per-property metadata.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::model::{Key, Value};

/// A property slot: the value plus its writability and enumerability.
#[derive(Debug, Clone)]
pub struct Property {
    pub value: Value,
    /// Non-writable properties cannot be reassigned or deleted in place.
    pub writable: bool,
    /// Non-enumerable properties are skipped by [`crate::assign`].
    pub enumerable: bool,
}

impl Property {
    /// A writable, enumerable data property.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            writable: true,
            enumerable: true,
        }
    }

    /// An enumerable property that cannot be changed or deleted.
    pub fn readonly(value: Value) -> Self {
        Self {
            value,
            writable: false,
            enumerable: true,
        }
    }

    /// A writable property hidden from enumeration.
    pub fn hidden(value: Value) -> Self {
        Self {
            value,
            writable: true,
            enumerable: false,
        }
    }
}

/// String/symbol keyed record.
///
/// Entries keep insertion order; lookups go through an FxHashMap index
/// from key to entry position.
#[derive(Clone, Default)]
pub struct Record {
    entries: Vec<(Key, Property)>,
    index: FxHashMap<Key, usize>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.property(key).map(|prop| &prop.value)
    }

    pub fn get_mut(&mut self, key: &Key) -> Option<&mut Value> {
        let pos = *self.index.get(key)?;
        Some(&mut self.entries[pos].1.value)
    }

    pub fn property(&self, key: &Key) -> Option<&Property> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    /// Returns true if `key` may be assigned or deleted.
    ///
    /// Absent keys are writable: assigning them creates a new property.
    pub fn is_writable(&self, key: &Key) -> bool {
        self.property(key).is_none_or(|prop| prop.writable)
    }

    /// Sets a value, keeping the existing property's flags.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1.value, value)),
            None => {
                self.push_entry(key, Property::new(value));
                None
            }
        }
    }

    /// Defines a property, replacing both value and flags.
    pub fn define(&mut self, key: impl Into<Key>, property: Property) -> Option<Property> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, property)),
            None => {
                self.push_entry(key, property);
                None
            }
        }
    }

    fn push_entry(&mut self, key: Key, property: Property) {
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, property));
    }

    /// Removes a property, shifting later entries down.
    pub fn remove(&mut self, key: &Key) -> Option<Property> {
        let pos = self.index.remove(key)?;
        let (_, property) = self.entries.remove(pos);
        self.reindex_from(pos);
        Some(property)
    }

    /// Keeps only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Key, &Property) -> bool) {
        let before = self.entries.len();
        self.entries.retain(|(key, prop)| keep(key, prop));
        if self.entries.len() != before {
            self.index.clear();
            self.reindex_from(0);
        }
    }

    /// Moves the listed keys to the front, in the given order.
    ///
    /// Listed keys that are absent are ignored, duplicates count once.
    /// Unlisted keys follow in their original relative order.
    pub fn reorder(&mut self, front: &[Key]) {
        let mut seen = FxHashSet::default();
        let mut positions: Vec<usize> = front
            .iter()
            .filter(|key| seen.insert(*key))
            .filter_map(|key| self.index.get(key).copied())
            .collect();
        let placed: FxHashSet<usize> = positions.iter().copied().collect();
        positions.extend((0..self.entries.len()).filter(|pos| !placed.contains(pos)));

        let mut slots: Vec<Option<(Key, Property)>> = self.entries.drain(..).map(Some).collect();
        self.entries = positions.into_iter().filter_map(|pos| slots[pos].take()).collect();
        self.reindex_from(0);
    }

    fn reindex_from(&mut self, start: usize) {
        for (pos, (key, _)) in self.entries.iter().enumerate().skip(start) {
            self.index.insert(key.clone(), pos);
        }
    }

    /// Marks every property non-writable.
    pub fn freeze(&mut self) {
        for (_, prop) in &mut self.entries {
            prop.writable = false;
        }
    }

    /// Marks every property writable.
    pub fn thaw(&mut self) {
        for (_, prop) in &mut self.entries {
            prop.writable = true;
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, prop)| &prop.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().map(|(key, prop)| (key, &prop.value))
    }

    pub fn properties(&self) -> impl Iterator<Item = (&Key, &Property)> {
        self.entries.iter().map(|(key, prop)| (key, prop))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.entries.iter_mut().map(|(_, prop)| &mut prop.value)
    }

    /// Builds a record with the same keys and flags and transformed values.
    pub fn map_values(&self, mut f: impl FnMut(&Value) -> Value) -> Record {
        let mut out = Record::with_capacity(self.len());
        for (key, prop) in &self.entries {
            out.push_entry(
                key.clone(),
                Property {
                    value: f(&prop.value),
                    ..*prop
                },
            );
        }
        out
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut rec = Record::new();
        for (key, value) in iter {
            rec.insert(key, value);
        }
        rec
    }
}
