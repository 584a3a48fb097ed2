//! Shallow and deep cloning.
//!
//! Clones keep the container kind, the constructor of instances and the
//! property flags. Functions and symbols are always shared. Values whose
//! primary tag is on the cloner's shared list are shared too, at any depth.

use std::sync::Arc;

use lazy_static::lazy_static;
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::classify::tag;
use crate::model::{Instance, Value};

lazy_static! {
    /// Tags shared by reference unless a cloner says otherwise.
    pub static ref DEFAULT_SHARED_TAGS: FxHashSet<String> =
        ["URL"].into_iter().map(String::from).collect();

    static ref DEFAULT_CLONER: Cloner = Cloner::default();
}

/// Clone configuration: which tags are treated as immutable leaves.
#[derive(Debug, Clone)]
pub struct Cloner {
    shared: FxHashSet<String>,
}

impl Default for Cloner {
    fn default() -> Self {
        Self {
            shared: DEFAULT_SHARED_TAGS.clone(),
        }
    }
}

impl Cloner {
    /// A cloner sharing the default tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cloner that copies every container, sharing only functions and symbols.
    pub fn copy_all() -> Self {
        Self {
            shared: FxHashSet::default(),
        }
    }

    /// Adds `tag` to the shared list.
    pub fn share(mut self, tag: &str) -> Self {
        self.shared.insert(tag.to_string());
        self
    }

    /// Removes `tag` from the shared list.
    pub fn unshare(mut self, tag: &str) -> Self {
        self.shared.remove(tag);
        self
    }

    /// Returns true if `value` is passed along instead of copied.
    pub fn is_shared(&self, value: &Value) -> bool {
        match value {
            Value::Function(_) | Value::Symbol(_) => true,
            _ if value.is_primitive() => true,
            _ => !self.shared.is_empty() && self.shared.contains(&tag(value)),
        }
    }

    /// Copies the outer container; nested values stay shared.
    pub fn clone_value(&self, value: &Value) -> Value {
        if self.is_shared(value) {
            return value.clone();
        }
        match value {
            Value::Sequence(seq) => Value::Sequence(Arc::new((**seq).clone())),
            Value::Record(rec) => Value::Record(Arc::new((**rec).clone())),
            Value::Set(set) => Value::Set(Arc::new((**set).clone())),
            Value::Map(map) => Value::Map(Arc::new((**map).clone())),
            Value::Buffer(buf) => Value::Buffer(Arc::new((**buf).clone())),
            Value::Tagged(instance) => Value::Tagged(Arc::new((**instance).clone())),
            _ => value.clone(),
        }
    }

    /// Copies the whole graph except shared leaves.
    pub fn clone_deep(&self, value: &Value) -> Value {
        if self.is_shared(value) {
            return value.clone();
        }
        match value {
            Value::Sequence(seq) => Value::from(seq.map_items(|item| self.clone_deep(item))),
            Value::Record(rec) => Value::from(rec.map_values(|item| self.clone_deep(item))),
            Value::Set(set) => Value::from(set.map_members(|item| self.clone_deep(item))),
            Value::Map(map) => Value::from(map.map_entries(|item| self.clone_deep(item))),
            Value::Buffer(buf) => Value::Buffer(Arc::new((**buf).clone())),
            Value::Tagged(instance) => Value::from(Instance::new(
                instance.constructor().clone(),
                instance.projection().map_values(|item| self.clone_deep(item)),
            )),
            _ => value.clone(),
        }
    }
}

/// One-level copy with the default cloner.
pub fn clone(value: &Value) -> Value {
    DEFAULT_CLONER.clone_value(value)
}

/// Full-graph copy with the default cloner.
pub fn clone_deep(value: &Value) -> Value {
    trace!(tag = %tag(value), "deep clone");
    DEFAULT_CLONER.clone_deep(value)
}
