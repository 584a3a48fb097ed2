//! Data model types for deepgraph.
//!
//! This module contains the value graph the engine walks:
//! - Keys and symbols (record addressing)
//! - Values (the closed union of every supported kind)
//! - Containers (records, sequences, sets, maps, typed buffers)
//! - Constructors and instances (class-like values with a plain projection)
//! - Builders (ergonomic construction)

pub mod buffer;
pub mod builder;
pub mod collection;
pub mod instance;
pub mod key;
pub mod record;
pub mod value;

pub use buffer::{Buffer, BufferKind};
pub use builder::RecordBuilder;
pub use collection::{OrderedMap, Sequence, UniqueSet};
pub use instance::{builtins, Constructor, Instance, Projectable};
pub use key::{Key, Symbol};
pub use record::{Property, Record};
pub use value::{Function, IdentityKey, Value};
