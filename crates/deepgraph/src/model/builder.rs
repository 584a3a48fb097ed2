//! Builder API for ergonomic value construction.
//!
//! # Example
//!
//! ```rust
//! use deepgraph::model::RecordBuilder;
//! use deepgraph::Value;
//!
//! let state = RecordBuilder::new()
//!     .entry("user", "alice")
//!     .readonly("id", 7)
//!     .record("prefs", |p| p.entry("theme", "dark"))
//!     .list("tags", ["a", "b"])
//!     .into_value();
//!
//! assert!(state.get("prefs").is_some_and(Value::is_record));
//! ```

use crate::model::{Constructor, Instance, Key, Property, Record, Sequence, Value};

/// Builder for constructing a [`Record`].
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a writable, enumerable property.
    pub fn entry(mut self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.record.insert(key, value);
        self
    }

    /// Adds a non-writable property.
    pub fn readonly(mut self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.record.define(key, Property::readonly(value.into()));
        self
    }

    /// Adds a non-enumerable property.
    pub fn hidden(mut self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.record.define(key, Property::hidden(value.into()));
        self
    }

    /// Adds a nested record built by `f`.
    pub fn record<F>(mut self, key: impl Into<Key>, f: F) -> Self
    where
        F: FnOnce(RecordBuilder) -> RecordBuilder,
    {
        self.record.insert(key, f(RecordBuilder::new()).into_value());
        self
    }

    /// Adds a sequence of values.
    pub fn list<I, V>(mut self, key: impl Into<Key>, items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let seq: Sequence = items.into_iter().map(Into::into).collect();
        self.record.insert(key, seq);
        self
    }

    /// Freezes every property added so far.
    pub fn frozen(mut self) -> Self {
        self.record.freeze();
        self
    }

    pub fn build(self) -> Record {
        self.record
    }

    pub fn into_value(self) -> Value {
        Value::from(self.record)
    }

    /// Wraps the record as the projection of an instance of `constructor`.
    pub fn into_instance(self, constructor: Constructor) -> Value {
        Value::from(Instance::new(constructor, self.record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_flags() {
        let rec = RecordBuilder::new()
            .entry("a", 1)
            .readonly("b", 2)
            .hidden("c", 3)
            .build();
        assert!(rec.is_writable(&Key::from("a")));
        assert!(!rec.is_writable(&Key::from("b")));
        assert!(rec.property(&Key::from("c")).is_some_and(|p| !p.enumerable));
    }

    #[test]
    fn test_builder_frozen() {
        let rec = RecordBuilder::new().entry("a", 1).entry("b", 2).frozen().build();
        assert!(rec.keys().all(|k| !rec.is_writable(k)));
    }
}
