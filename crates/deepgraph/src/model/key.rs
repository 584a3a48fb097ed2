//! Record keys and symbols.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::Value;

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// A unique, optionally described symbol.
///
/// Every call to [`Symbol::new`] yields a symbol distinct from all others,
/// even when the descriptions match. Clones compare equal to the original.
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Option<Arc<str>>,
}

impl Symbol {
    /// Creates a fresh symbol.
    pub fn new(description: Option<&str>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: description.map(Arc::from),
        }
    }

    /// Returns the process-unique identifier of this symbol.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the description given at creation.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

/// A record key: a string or a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Str(Arc<str>),
    Symbol(Symbol),
}

impl Key {
    /// Coerces a value into a record key.
    ///
    /// Strings and symbols map directly; numbers use their canonical
    /// decimal spelling (`1.0` becomes `"1"`). Anything else has no key form.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::String(s) => Some(Key::Str(s.clone())),
            Value::Symbol(sym) => Some(Key::Symbol(sym.clone())),
            Value::Number(n) => Some(Key::Str(number_to_key(*n).into())),
            _ => None,
        }
    }

    /// Returns the key as a value (string or symbol).
    pub fn to_value(&self) -> Value {
        match self {
            Key::Str(s) => Value::String(s.clone()),
            Key::Symbol(sym) => Value::Symbol(sym.clone()),
        }
    }

    /// Returns the string form, or `None` for symbols.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            Key::Symbol(_) => None,
        }
    }

    /// Returns true if this is a `$`-prefixed string key.
    pub fn is_directive(&self) -> bool {
        self.as_str().is_some_and(|s| s.starts_with('$'))
    }
}

/// Spells a number the way it appears as a property name.
pub(crate) fn number_to_key(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => f.write_str(s),
            Key::Symbol(sym) => write!(f, "{sym:?}"),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(Arc::from(s))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(Arc::from(s))
    }
}

impl From<Arc<str>> for Key {
    fn from(s: Arc<str>) -> Self {
        Key::Str(s)
    }
}

impl From<Symbol> for Key {
    fn from(sym: Symbol) -> Self {
        Key::Symbol(sym)
    }
}

impl From<&Symbol> for Key {
    fn from(sym: &Symbol) -> Self {
        Key::Symbol(sym.clone())
    }
}
