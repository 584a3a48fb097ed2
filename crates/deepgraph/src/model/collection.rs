//! Sequences, unique sets and ordered maps.
//!
//! Sets and maps use SameValueZero uniqueness: primitives by content,
//! containers by identity. Like [`crate::model::Record`], they keep entries
//! in a `Vec` for order and an FxHashMap for position lookup.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::model::{IdentityKey, Value};

/// An ordered, index-addressable list of values.
#[derive(Clone, Default)]
pub struct Sequence {
    items: Vec<Value>,
    frozen: bool,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index)
    }

    /// Writes `value` at `index`, padding with `Undefined` past the end.
    pub fn set(&mut self, index: usize, value: Value) {
        if index >= self.items.len() {
            self.items.resize(index + 1, Value::Undefined);
        }
        self.items[index] = value;
    }

    pub fn push(&mut self, value: Value) {
        self.items.push(value);
    }

    pub fn remove(&mut self, index: usize) -> Option<Value> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn retain(&mut self, keep: impl FnMut(&Value) -> bool) {
        self.items.retain(keep);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Value> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    /// Rejects every later write or delete through the selection utilities.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn thaw(&mut self) {
        self.frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Builds a sequence of transformed items, keeping the frozen flag.
    pub fn map_items(&self, f: impl FnMut(&Value) -> Value) -> Sequence {
        Sequence {
            items: self.items.iter().map(f).collect(),
            frozen: self.frozen,
        }
    }
}

impl Extend<Value> for Sequence {
    fn extend<I: IntoIterator<Item = Value>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl FromIterator<Value> for Sequence {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Sequence {
            items: iter.into_iter().collect(),
            frozen: false,
        }
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

/// An insertion-ordered set of unique values.
#[derive(Clone, Default)]
pub struct UniqueSet {
    members: Vec<Value>,
    index: FxHashMap<IdentityKey, usize>,
    frozen: bool,
}

impl UniqueSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.index.contains_key(&value.identity_key())
    }

    pub(crate) fn position(&self, value: &Value) -> Option<usize> {
        self.index.get(&value.identity_key()).copied()
    }

    /// Adds a member. Returns false if an identical member was present.
    pub fn insert(&mut self, value: Value) -> bool {
        let id = value.identity_key();
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id, self.members.len());
        self.members.push(value);
        true
    }

    /// Replaces the member at `old`'s position with `new`.
    ///
    /// When `new` is already a member elsewhere, `old` is dropped instead.
    pub fn replace(&mut self, old: &Value, new: Value) -> bool {
        let Some(pos) = self.position(old) else {
            return self.insert(new);
        };
        let new_id = new.identity_key();
        if let Some(&existing) = self.index.get(&new_id) {
            if existing != pos {
                self.remove(old);
            }
            return false;
        }
        self.index.remove(&old.identity_key());
        self.index.insert(new_id, pos);
        self.members[pos] = new;
        true
    }

    pub fn remove(&mut self, value: &Value) -> bool {
        let Some(pos) = self.index.remove(&value.identity_key()) else {
            return false;
        };
        self.members.remove(pos);
        for (offset, member) in self.members.iter().enumerate().skip(pos) {
            self.index.insert(member.identity_key(), offset);
        }
        true
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.members.iter()
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn thaw(&mut self) {
        self.frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Builds a set of transformed members, keeping the frozen flag.
    pub fn map_members(&self, f: impl FnMut(&Value) -> Value) -> UniqueSet {
        let mut out: UniqueSet = self.members.iter().map(f).collect();
        out.frozen = self.frozen;
        out
    }
}

impl FromIterator<Value> for UniqueSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut set = UniqueSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl fmt::Debug for UniqueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(&self.members).finish()
    }
}

/// An insertion-ordered map with unique keys.
#[derive(Clone, Default)]
pub struct OrderedMap {
    entries: Vec<(Value, Value)>,
    index: FxHashMap<IdentityKey, usize>,
    frozen: bool,
}

impl OrderedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.index.contains_key(&key.identity_key())
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        let pos = *self.index.get(&key.identity_key())?;
        Some(&self.entries[pos].1)
    }

    pub fn get_mut(&mut self, key: &Value) -> Option<&mut Value> {
        let pos = *self.index.get(&key.identity_key())?;
        Some(&mut self.entries[pos].1)
    }

    /// Sets the value for `key`, keeping its position if present.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        let id = key.identity_key();
        match self.index.get(&id) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(id, self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let pos = self.index.remove(&key.identity_key())?;
        let (_, value) = self.entries.remove(pos);
        for (offset, (k, _)) in self.entries.iter().enumerate().skip(pos) {
            self.index.insert(k.identity_key(), offset);
        }
        Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn thaw(&mut self) {
        self.frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Builds a map with transformed keys and values, keeping the frozen flag.
    pub fn map_entries(&self, mut f: impl FnMut(&Value) -> Value) -> OrderedMap {
        let mut out: OrderedMap = self.entries.iter().map(|(k, v)| (f(k), f(v))).collect();
        out.frozen = self.frozen;
        out
    }
}

impl FromIterator<(Value, Value)> for OrderedMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl fmt::Debug for OrderedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
