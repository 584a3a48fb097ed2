//! The `$` directive language of merge layers.
//!
//! A layer is a record. Its ordinary keys merge into the target; its
//! `$`-prefixed keys are directives that edit the target structurally.
//! Layers are parsed into a [`Layer`] tree up front, so a malformed layer
//! is rejected before anything is touched.
//!
//! Application order within a layer:
//! 1. ordinary keys (plain records recurse, everything else replaces)
//! 2. directives, in document order

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::clone::clone_deep;
use crate::error::Error;
use crate::model::{Key, Record, Sequence, Value};

/// Directive keys as spelled in a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveName {
    Set,
    Unset,
    Omit,
    Leave,
    Pick,
    Push,
    Pull,
    Concat,
    Default,
    Defaults,
    KeySortOrder,
    PropSortOrder,
}

impl DirectiveName {
    /// Looks up a `$` key. Returns `None` for unknown spellings.
    pub fn parse(key: &str) -> Option<DirectiveName> {
        let name = match key {
            "$set" => DirectiveName::Set,
            "$unset" => DirectiveName::Unset,
            "$omit" => DirectiveName::Omit,
            "$leave" => DirectiveName::Leave,
            "$pick" => DirectiveName::Pick,
            "$push" => DirectiveName::Push,
            "$pull" => DirectiveName::Pull,
            "$concat" => DirectiveName::Concat,
            "$default" => DirectiveName::Default,
            "$defaults" => DirectiveName::Defaults,
            "$keySortOrder" => DirectiveName::KeySortOrder,
            "$propSortOrder" => DirectiveName::PropSortOrder,
            _ => return None,
        };
        Some(name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveName::Set => "$set",
            DirectiveName::Unset => "$unset",
            DirectiveName::Omit => "$omit",
            DirectiveName::Leave => "$leave",
            DirectiveName::Pick => "$pick",
            DirectiveName::Push => "$push",
            DirectiveName::Pull => "$pull",
            DirectiveName::Concat => "$concat",
            DirectiveName::Default => "$default",
            DirectiveName::Defaults => "$defaults",
            DirectiveName::KeySortOrder => "$keySortOrder",
            DirectiveName::PropSortOrder => "$propSortOrder",
        }
    }
}

impl fmt::Display for DirectiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed directive with its payload.
///
/// Aliases collapse into one variant: `$unset`/`$omit` into `Unset`,
/// `$leave`/`$pick` into `Leave`, `$default`/`$defaults` into `Default`,
/// `$keySortOrder`/`$propSortOrder` into `KeySortOrder`.
#[derive(Debug, Clone)]
pub enum Directive {
    /// Assign each value wholesale, overwriting. Dotted keys address
    /// nested records.
    Set(Vec<(Key, Value)>),
    /// Delete the listed keys.
    Unset(Vec<Key>),
    /// Delete every key except the listed ones.
    Leave(Vec<Key>),
    /// Append one value to the sequence at each key.
    Push(Vec<(Key, Value)>),
    /// Remove every element equal to one of the values.
    Pull(Vec<(Key, Vec<Value>)>),
    /// Append all values to the sequence at each key.
    Concat(Vec<(Key, Vec<Value>)>),
    /// Assign each value only where the key is absent.
    Default(Vec<(Key, Value)>),
    /// Move the listed keys to the front, in order.
    KeySortOrder(Vec<Key>),
}

impl Directive {
    /// Parses the payload of directive `name`.
    pub fn parse(name: DirectiveName, payload: &Value) -> Result<Directive, Error> {
        let directive = match name {
            DirectiveName::Set => Directive::Set(assignments(name, payload)?),
            DirectiveName::Unset | DirectiveName::Omit => Directive::Unset(key_list(name, payload)?),
            DirectiveName::Leave | DirectiveName::Pick => Directive::Leave(key_list(name, payload)?),
            DirectiveName::Push => Directive::Push(assignments(name, payload)?),
            DirectiveName::Pull => Directive::Pull(spread(assignments(name, payload)?)),
            DirectiveName::Concat => Directive::Concat(spread(assignments(name, payload)?)),
            DirectiveName::Default | DirectiveName::Defaults => {
                Directive::Default(assignments(name, payload)?)
            }
            DirectiveName::KeySortOrder | DirectiveName::PropSortOrder => {
                Directive::KeySortOrder(key_list(name, payload)?)
            }
        };
        Ok(directive)
    }
}

fn key_list(name: DirectiveName, payload: &Value) -> Result<Vec<Key>, Error> {
    let items: Vec<&Value> = match payload {
        Value::Sequence(seq) => seq.iter().collect(),
        Value::Set(set) => set.iter().collect(),
        Value::String(_) | Value::Symbol(_) => vec![payload],
        _ => {
            return Err(Error::InvalidDirective {
                directive: name.as_str(),
                reason: "expected a list of keys",
            });
        }
    };
    items
        .into_iter()
        .map(|item| {
            Key::from_value(item).ok_or(Error::InvalidDirective {
                directive: name.as_str(),
                reason: "keys must be strings, symbols or numbers",
            })
        })
        .collect()
}

fn assignments(name: DirectiveName, payload: &Value) -> Result<Vec<(Key, Value)>, Error> {
    let rec = payload.as_record().ok_or(Error::InvalidDirective {
        directive: name.as_str(),
        reason: "expected a record",
    })?;
    Ok(rec.iter().map(|(key, value)| (key.clone(), value.clone())).collect())
}

fn spread(pairs: Vec<(Key, Value)>) -> Vec<(Key, Vec<Value>)> {
    pairs
        .into_iter()
        .map(|(key, value)| {
            let values = match &value {
                Value::Sequence(seq) => seq.as_slice().to_vec(),
                _ => vec![value],
            };
            (key, values)
        })
        .collect()
}

/// One parsed layer.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    entries: Vec<(Key, Entry)>,
    directives: Vec<(DirectiveName, Directive)>,
}

/// An ordinary layer entry.
#[derive(Debug, Clone)]
enum Entry {
    /// A plain record: merged into the target's record at this key.
    Merge(Layer),
    /// Anything else: replaces the target's value at this key.
    Assign(Value),
}

impl Layer {
    /// Parses `record` and every plain record nested in its ordinary keys.
    pub fn parse(record: &Record) -> Result<Layer, Error> {
        let mut layer = Layer::default();
        for (key, value) in record.iter() {
            if let Some(spelled) = key.as_str().filter(|_| key.is_directive()) {
                let name = DirectiveName::parse(spelled).ok_or_else(|| Error::UnknownDirective {
                    key: spelled.to_string(),
                })?;
                layer.directives.push((name, Directive::parse(name, value)?));
                continue;
            }
            let entry = match value {
                Value::Record(nested) => Entry::Merge(Layer::parse(nested)?),
                _ => Entry::Assign(value.clone()),
            };
            layer.entries.push((key.clone(), entry));
        }
        Ok(layer)
    }

    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter().map(|(_, directive)| directive)
    }

}

/// How values taken from a layer are attached to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attach {
    /// Share the layer's value.
    Reference,
    /// Deep-clone the layer's value first.
    Clone,
}

impl Attach {
    pub fn attach(self, value: &Value) -> Value {
        match self {
            Attach::Reference => value.clone(),
            Attach::Clone => clone_deep(value),
        }
    }
}

/// Applies `layer` onto `target`.
pub fn apply_layer(target: &mut Record, layer: &Layer, attach: Attach) {
    debug!(
        entries = layer.entries.len(),
        directives = layer.directives.len(),
        "applying layer"
    );
    for (key, entry) in &layer.entries {
        match entry {
            Entry::Assign(value) => {
                target.insert(key.clone(), attach.attach(value));
            }
            Entry::Merge(nested) => merge_child(target, key, nested, attach),
        }
    }
    for (name, directive) in &layer.directives {
        trace!(directive = %name, "applying directive");
        apply_directive(target, directive, attach);
    }
}

fn merge_child(target: &mut Record, key: &Key, nested: &Layer, attach: Attach) {
    if let Some(Value::Record(child)) = target.get_mut(key) {
        apply_layer(Arc::make_mut(child), nested, attach);
        return;
    }
    let mut fresh = Record::new();
    apply_layer(&mut fresh, nested, attach);
    target.insert(key.clone(), fresh);
}

fn apply_directive(target: &mut Record, directive: &Directive, attach: Attach) {
    match directive {
        Directive::Set(pairs) => {
            for (key, value) in pairs {
                set_path(target, key, attach.attach(value));
            }
        }
        Directive::Unset(keys) => {
            for key in keys {
                target.remove(key);
            }
        }
        Directive::Leave(keys) => {
            let keep: FxHashSet<&Key> = keys.iter().collect();
            target.retain(|key, _| keep.contains(key));
        }
        Directive::Push(pairs) => {
            for (key, value) in pairs {
                with_sequence(target, key, |seq| seq.push(attach.attach(value)));
            }
        }
        Directive::Pull(pairs) => {
            for (key, values) in pairs {
                if let Some(Value::Sequence(seq)) = target.get_mut(key) {
                    if seq.iter().any(|item| values.contains(item)) {
                        Arc::make_mut(seq).retain(|item| !values.contains(item));
                    }
                }
            }
        }
        Directive::Concat(pairs) => {
            for (key, values) in pairs {
                with_sequence(target, key, |seq| {
                    seq.extend(values.iter().map(|value| attach.attach(value)))
                });
            }
        }
        Directive::Default(pairs) => {
            for (key, value) in pairs {
                if !target.contains_key(key) {
                    target.insert(key.clone(), attach.attach(value));
                }
            }
        }
        Directive::KeySortOrder(keys) => target.reorder(keys),
    }
}

/// Assigns `value` at `key`, walking a dotted key (`"a.b.c"`) down nested
/// records. Missing or non-record steps become fresh records. A key with an
/// empty segment is assigned literally.
fn set_path(target: &mut Record, key: &Key, value: Value) {
    let path: Vec<&str> = match key.as_str() {
        Some(s) if s.contains('.') && !s.split('.').any(str::is_empty) => s.split('.').collect(),
        _ => {
            target.insert(key.clone(), value);
            return;
        }
    };
    assign_path(target, &path, value);
}

fn assign_path(target: &mut Record, path: &[&str], value: Value) {
    match path {
        [] => {}
        [last] => {
            target.insert(*last, value);
        }
        [first, rest @ ..] => {
            let key = Key::from(*first);
            if let Some(Value::Record(child)) = target.get_mut(&key) {
                assign_path(Arc::make_mut(child), rest, value);
                return;
            }
            let mut fresh = Record::new();
            assign_path(&mut fresh, rest, value);
            target.insert(key, fresh);
        }
    }
}

/// Runs `f` on the sequence at `key`, starting a fresh one if the slot is
/// missing or holds something else.
fn with_sequence(target: &mut Record, key: &Key, f: impl FnOnce(&mut Sequence)) {
    if let Some(Value::Sequence(seq)) = target.get_mut(key) {
        f(Arc::make_mut(seq));
        return;
    }
    let mut seq = Sequence::new();
    f(&mut seq);
    target.insert(key.clone(), seq);
}
