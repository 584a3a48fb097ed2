//! deepgraph: deep clone, merge, patch and update for heterogeneous value graphs.
//!
//! This crate provides the transforms behind reducer-style state updates:
//! copying, layering and editing trees of records, sequences, sets, maps,
//! typed buffers and class instances without losing their type.
//!
//! # Overview
//!
//! A [`Value`] is a closed enum. Containers are reference-counted, so a
//! value can be shared between many trees and every transform decides
//! explicitly whether to share or copy:
//! - **Clone**: [`clone()`] copies one level, [`clone_deep`] the whole graph
//! - **Merge**: [`merge_deep`] layers records onto a copy of a base
//! - **Patch**: [`patch_deep`] layers records onto the base itself
//! - **Update**: [`update_deep`] returns the base unchanged if nothing changed
//!
//! Merge layers may carry `$` directives (`$unset`, `$push`, `$keySortOrder`,
//! ...) that edit the target structurally instead of assigning a key.
//!
//! # Quick Start
//!
//! ```rust
//! use deepgraph::{merge_deep, update_deep, RecordBuilder, Value};
//!
//! let state = RecordBuilder::new()
//!     .entry("a", "a")
//!     .entry("b", "b")
//!     .list("tags", ["x"])
//!     .into_value();
//!
//! // Layer a change on a copy
//! let next = merge_deep(
//!     &state,
//!     &[RecordBuilder::new()
//!         .list("$unset", ["a"])
//!         .record("$push", |r| r.entry("tags", "y"))
//!         .into_value()],
//! )
//! .unwrap();
//! assert_eq!(next.get("a"), None);
//! assert_eq!(next.get("tags"), Some(&Value::from(vec!["x", "y"])));
//! assert!(state.get("a").is_some());
//!
//! // A no-op update hands back the same value
//! let same = update_deep(&state, &[RecordBuilder::new().entry("b", "b").into_value()]).unwrap();
//! assert!(Value::ptr_eq(&same, &state));
//! ```
//!
//! # Modules
//!
//! - [`model`]: The value model (Value, Record, Sequence, UniqueSet, OrderedMap, Buffer, Instance)
//! - [`classify`]: Tags, constructors and prototype chains
//! - [`access`]: Uniform container access, `assign` and `defaults`
//! - [`mod@clone`]: Shallow and deep cloning with a shared-tag allow-list
//! - [`directive`]: The `$` directive language of merge layers
//! - [`transform`]: Merge, patch and update
//! - [`select`]: `pick`, `omit`, `leave`, `unset` and `map`
//! - [`error`]: Error types
//!
//! # Atomicity
//!
//! A call that returns an error has not mutated anything:
//! - merge layers are fully parsed before the first one is applied
//! - readonly checks cover every affected key before the first write

pub mod access;
pub mod classify;
pub mod clone;
pub mod compare;
pub mod directive;
pub mod error;
pub mod model;
pub mod select;
pub mod transform;

// Re-export commonly used types at crate root
pub use access::{
    as_container, as_container_mut, assign, assign_complete, defaults, has_own,
    key_and_symbol_entries, keys_and_symbols, Container,
};
pub use classify::{c9r, proto, proto_c9r, tag, tags, Prototype};
pub use clone::{clone, clone_deep, Cloner, DEFAULT_SHARED_TAGS};
pub use compare::{deep_equal, deep_equal_ordered, same_value_zero};
pub use directive::{Directive, DirectiveName};
pub use error::{Error, ErrorCode};
pub use model::{
    builtins, Buffer, BufferKind, Constructor, Function, Instance, Key, OrderedMap, Projectable,
    Property, Record, RecordBuilder, Sequence, Symbol, UniqueSet, Value,
};
pub use select::{leave, map, omit, pick, unset, TransformOptions};
pub use transform::{
    merge_clones_deep, merge_deep, patch_clones_deep, patch_deep, update_clones_deep, update_deep,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
