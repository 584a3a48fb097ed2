//! Uniform access to the container kinds.
//!
//! The [`Container`] trait gives records, sequences, sets, maps, typed
//! buffers and instance projections one get/set/remove/entries surface.
//! Keys are passed as [`Value`]s and coerced per kind:
//! - record: string, symbol, or number (spelled as a string)
//! - sequence and buffer: non-negative integer index, or its decimal string
//! - set: the member itself
//! - map: the map key

use std::sync::Arc;

use tracing::debug;

use crate::error::Error;
use crate::model::{
    Buffer, IdentityKey, Instance, Key, OrderedMap, Property, Record, Sequence, UniqueSet, Value,
};

/// Get/set/remove over one container kind.
pub trait Container {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Own keys in container order.
    fn keys(&self) -> Vec<Value>;

    fn get(&self, key: &Value) -> Option<Value>;

    fn has_own(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// Own `(key, value)` pairs in container order.
    fn entries(&self) -> Vec<(Value, Value)> {
        self.keys()
            .into_iter()
            .filter_map(|key| self.get(&key).map(|value| (key, value)))
            .collect()
    }

    /// Identity of `key` as it would appear among [`Container::keys`].
    fn key_identity(&self, key: &Value) -> Option<IdentityKey> {
        Some(key.identity_key())
    }

    /// Returns true if `key` may be overwritten.
    fn is_writable(&self, key: &Value) -> bool;

    /// Returns true if `key` may be removed.
    fn is_removable(&self, key: &Value) -> bool {
        self.is_writable(key)
    }

    fn set(&mut self, key: &Value, value: Value) -> Result<(), Error>;

    fn remove(&mut self, key: &Value) -> Result<Option<Value>, Error>;

    /// Makes every entry writable.
    fn thaw(&mut self);
}

fn readonly(key: &Value) -> Error {
    Error::ReadonlyViolation {
        key: describe_key(key),
    }
}

/// Human-readable key for error messages.
pub(crate) fn describe_key(key: &Value) -> String {
    match Key::from_value(key) {
        Some(key) => key.to_string(),
        None => format!("{key:?}"),
    }
}

/// Largest array length; valid indices are below it.
const MAX_INDEX: u64 = u32::MAX as u64;

/// Coerces a key to a sequence or buffer index.
///
/// Accepts integral numbers and canonical decimal strings (no sign, no
/// leading zeros) below 2^32 - 1.
pub(crate) fn index_of(key: &Value) -> Option<usize> {
    let index = match key {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n < MAX_INDEX as f64 => *n as u64,
        Value::String(s) => {
            let canonical = !s.is_empty()
                && s.bytes().all(|b| b.is_ascii_digit())
                && (&**s == "0" || !s.starts_with('0'));
            if !canonical {
                return None;
            }
            s.parse::<u64>().ok().filter(|i| *i < MAX_INDEX)?
        }
        _ => return None,
    };
    usize::try_from(index).ok()
}

impl Container for Record {
    fn len(&self) -> usize {
        Record::len(self)
    }

    fn keys(&self) -> Vec<Value> {
        Record::keys(self).map(Key::to_value).collect()
    }

    fn get(&self, key: &Value) -> Option<Value> {
        Record::get(self, &Key::from_value(key)?).cloned()
    }

    fn key_identity(&self, key: &Value) -> Option<IdentityKey> {
        Key::from_value(key).map(|key| key.to_value().identity_key())
    }

    fn is_writable(&self, key: &Value) -> bool {
        Key::from_value(key).is_none_or(|key| Record::is_writable(self, &key))
    }

    fn set(&mut self, key: &Value, value: Value) -> Result<(), Error> {
        let Some(record_key) = Key::from_value(key) else {
            return Ok(());
        };
        if !Record::is_writable(self, &record_key) {
            return Err(readonly(key));
        }
        self.insert(record_key, value);
        Ok(())
    }

    fn remove(&mut self, key: &Value) -> Result<Option<Value>, Error> {
        let Some(record_key) = Key::from_value(key) else {
            return Ok(None);
        };
        if !Record::is_writable(self, &record_key) {
            return Err(readonly(key));
        }
        Ok(Record::remove(self, &record_key).map(|prop| prop.value))
    }

    fn thaw(&mut self) {
        Record::thaw(self)
    }
}

impl Container for Sequence {
    fn len(&self) -> usize {
        Sequence::len(self)
    }

    fn keys(&self) -> Vec<Value> {
        (0..self.len()).map(|i| Value::Number(i as f64)).collect()
    }

    fn get(&self, key: &Value) -> Option<Value> {
        Sequence::get(self, index_of(key)?).cloned()
    }

    fn key_identity(&self, key: &Value) -> Option<IdentityKey> {
        index_of(key).map(|i| IdentityKey::number(i as f64))
    }

    fn is_writable(&self, _key: &Value) -> bool {
        !self.is_frozen()
    }

    fn set(&mut self, key: &Value, value: Value) -> Result<(), Error> {
        if self.is_frozen() {
            return Err(readonly(key));
        }
        if let Some(index) = index_of(key) {
            Sequence::set(self, index, value);
        }
        Ok(())
    }

    fn remove(&mut self, key: &Value) -> Result<Option<Value>, Error> {
        if self.is_frozen() {
            return Err(readonly(key));
        }
        Ok(index_of(key).and_then(|index| Sequence::remove(self, index)))
    }

    fn thaw(&mut self) {
        Sequence::thaw(self)
    }
}

impl Container for UniqueSet {
    fn len(&self) -> usize {
        UniqueSet::len(self)
    }

    fn keys(&self) -> Vec<Value> {
        self.iter().cloned().collect()
    }

    fn get(&self, key: &Value) -> Option<Value> {
        let pos = self.position(key)?;
        self.iter().nth(pos).cloned()
    }

    fn is_writable(&self, _key: &Value) -> bool {
        !self.is_frozen()
    }

    /// Replaces the member `key` with `value` in place (or adds `value`).
    fn set(&mut self, key: &Value, value: Value) -> Result<(), Error> {
        if self.is_frozen() {
            return Err(readonly(key));
        }
        self.replace(key, value);
        Ok(())
    }

    fn remove(&mut self, key: &Value) -> Result<Option<Value>, Error> {
        if self.is_frozen() {
            return Err(readonly(key));
        }
        let member = Container::get(self, key);
        UniqueSet::remove(self, key);
        Ok(member)
    }

    fn thaw(&mut self) {
        UniqueSet::thaw(self)
    }
}

impl Container for OrderedMap {
    fn len(&self) -> usize {
        OrderedMap::len(self)
    }

    fn keys(&self) -> Vec<Value> {
        OrderedMap::keys(self).cloned().collect()
    }

    fn get(&self, key: &Value) -> Option<Value> {
        OrderedMap::get(self, key).cloned()
    }

    fn is_writable(&self, _key: &Value) -> bool {
        !self.is_frozen()
    }

    fn set(&mut self, key: &Value, value: Value) -> Result<(), Error> {
        if self.is_frozen() {
            return Err(readonly(key));
        }
        self.insert(key.clone(), value);
        Ok(())
    }

    fn remove(&mut self, key: &Value) -> Result<Option<Value>, Error> {
        if self.is_frozen() {
            return Err(readonly(key));
        }
        Ok(OrderedMap::remove(self, key))
    }

    fn thaw(&mut self) {
        OrderedMap::thaw(self)
    }
}

impl Container for Buffer {
    fn len(&self) -> usize {
        Buffer::len(self)
    }

    fn keys(&self) -> Vec<Value> {
        (0..self.len()).map(|i| Value::Number(i as f64)).collect()
    }

    fn get(&self, key: &Value) -> Option<Value> {
        Buffer::get(self, index_of(key)?)
    }

    fn key_identity(&self, key: &Value) -> Option<IdentityKey> {
        index_of(key).map(|i| IdentityKey::number(i as f64))
    }

    fn is_writable(&self, key: &Value) -> bool {
        index_of(key).is_some_and(|i| i < self.len())
    }

    /// Elements are fixed; nothing can be removed.
    fn is_removable(&self, _key: &Value) -> bool {
        false
    }

    fn set(&mut self, key: &Value, value: Value) -> Result<(), Error> {
        match index_of(key) {
            Some(index) if Buffer::set(self, index, &value) => Ok(()),
            _ => Err(readonly(key)),
        }
    }

    fn remove(&mut self, key: &Value) -> Result<Option<Value>, Error> {
        Err(readonly(key))
    }

    fn thaw(&mut self) {}
}

impl Container for Instance {
    fn len(&self) -> usize {
        self.projection().len()
    }

    fn keys(&self) -> Vec<Value> {
        Container::keys(self.projection())
    }

    fn get(&self, key: &Value) -> Option<Value> {
        Container::get(self.projection(), key)
    }

    fn key_identity(&self, key: &Value) -> Option<IdentityKey> {
        self.projection().key_identity(key)
    }

    fn is_writable(&self, key: &Value) -> bool {
        Container::is_writable(self.projection(), key)
    }

    fn set(&mut self, key: &Value, value: Value) -> Result<(), Error> {
        Container::set(self.projection_mut(), key, value)
    }

    fn remove(&mut self, key: &Value) -> Result<Option<Value>, Error> {
        Container::remove(self.projection_mut(), key)
    }

    fn thaw(&mut self) {
        self.projection_mut().thaw()
    }
}

/// Borrows the container inside `value`, if it is one.
pub fn as_container(value: &Value) -> Option<&dyn Container> {
    match value {
        Value::Record(rec) => Some(&**rec),
        Value::Sequence(seq) => Some(&**seq),
        Value::Set(set) => Some(&**set),
        Value::Map(map) => Some(&**map),
        Value::Buffer(buf) => Some(&**buf),
        Value::Tagged(instance) => Some(&**instance),
        _ => None,
    }
}

/// Mutably borrows the container inside `value`, copying it first if shared.
pub fn as_container_mut(value: &mut Value) -> Option<&mut dyn Container> {
    match value {
        Value::Record(rec) => Some(Arc::make_mut(rec) as &mut dyn Container),
        Value::Sequence(seq) => Some(Arc::make_mut(seq) as &mut dyn Container),
        Value::Set(set) => Some(Arc::make_mut(set) as &mut dyn Container),
        Value::Map(map) => Some(Arc::make_mut(map) as &mut dyn Container),
        Value::Buffer(buf) => Some(Arc::make_mut(buf) as &mut dyn Container),
        Value::Tagged(instance) => Some(Arc::make_mut(instance) as &mut dyn Container),
        _ => None,
    }
}

/// Returns true if `container` has an own entry at `key`.
pub fn has_own(container: &Value, key: &Value) -> bool {
    as_container(container).is_some_and(|c| c.has_own(key))
}

/// Every own key, including symbols and non-enumerable properties.
pub fn keys_and_symbols(container: &Value) -> Vec<Value> {
    as_container(container).map_or_else(Vec::new, |c| c.keys())
}

/// Every own `(key, value)` pair, including symbols and non-enumerable properties.
pub fn key_and_symbol_entries(container: &Value) -> Vec<(Value, Value)> {
    as_container(container).map_or_else(Vec::new, |c| c.entries())
}

/// Copies enumerable own properties of `sources` onto `target`.
///
/// Copied properties land as writable and enumerable; existing flags on
/// the target are kept. Fails before writing anything if a target key
/// about to be overwritten is readonly. Non-record targets and sources
/// (other than instances, through their projection) are ignored.
pub fn assign(target: &mut Value, sources: &[Value]) -> Result<Value, Error> {
    let writes: Vec<(Key, Property)> = sources
        .iter()
        .filter_map(Value::plain)
        .flat_map(|rec| {
            rec.properties()
                .filter(|(_, prop)| prop.enumerable)
                .map(|(key, prop)| (key.clone(), Property::new(prop.value.clone())))
        })
        .collect();
    write_all(target, writes, false)
}

/// Copies every own property of `sources` onto `target`, flags included.
///
/// Non-enumerable properties come along and keep their writability.
/// Fails before writing anything if a target key is readonly.
pub fn assign_complete(target: &mut Value, sources: &[Value]) -> Result<Value, Error> {
    let writes: Vec<(Key, Property)> = sources
        .iter()
        .filter_map(Value::plain)
        .flat_map(|rec| rec.properties().map(|(key, prop)| (key.clone(), prop.clone())))
        .collect();
    write_all(target, writes, true)
}

fn write_all(target: &mut Value, writes: Vec<(Key, Property)>, with_flags: bool) -> Result<Value, Error> {
    let Some(current) = target.plain() else {
        return Ok(target.clone());
    };
    if let Some((key, _)) = writes.iter().find(|(key, _)| !current.is_writable(key)) {
        debug!(key = %key, "assign rejected: readonly key");
        return Err(Error::ReadonlyViolation { key: key.to_string() });
    }
    if let Some(rec) = target.plain_mut() {
        for (key, prop) in writes {
            if with_flags {
                rec.define(key, prop);
            } else {
                rec.insert(key, prop.value);
            }
        }
    }
    Ok(target.clone())
}

/// Copies enumerable properties of `sources` onto `target` for keys it lacks.
///
/// Earlier sources win over later ones. Never overwrites.
pub fn defaults(target: &mut Value, sources: &[Value]) -> Value {
    let missing: Vec<(Key, Value)> = match target.plain() {
        Some(current) => {
            let mut seen = rustc_hash::FxHashSet::default();
            sources
                .iter()
                .filter_map(Value::plain)
                .flat_map(|rec| rec.properties())
                .filter(|(key, prop)| prop.enumerable && !current.contains_key(key))
                .filter(|(key, _)| seen.insert((*key).clone()))
                .map(|(key, prop)| (key.clone(), prop.value.clone()))
                .collect()
        }
        None => return target.clone(),
    };
    if missing.is_empty() {
        return target.clone();
    }
    if let Some(rec) = target.plain_mut() {
        for (key, value) in missing {
            rec.insert(key, value);
        }
    }
    target.clone()
}
