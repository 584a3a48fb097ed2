//! The value union walked by every transform.
//!
//! Containers live behind `Arc`, so cloning a [`Value`] shares the container
//! rather than copying it. Edits go through `&mut Value` and copy on write,
//! which keeps every other holder of the container unaffected.

use std::fmt;
use std::sync::Arc;

use crate::model::{Buffer, Instance, Key, OrderedMap, Record, Sequence, Symbol, UniqueSet};

/// Signature of a native function carried in the graph.
pub type NativeFn = dyn Fn(&[Value]) -> Value + Send + Sync;

/// An opaque callable. Never cloned or merged, only passed along.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    call: Arc<NativeFn>,
}

impl Function {
    /// Wraps a closure as a named function value.
    pub fn new<F>(name: &str, call: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            call: Arc::new(call),
        }
    }

    /// Returns the function's name (empty for anonymous functions).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the function.
    pub fn call(&self, args: &[Value]) -> Value {
        (self.call)(args)
    }

    /// Returns true if both handles refer to the same function.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        self.addr() == other.addr()
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.call) as *const () as usize
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name)
    }
}

/// A node of the value graph.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(Arc<str>),
    BigInt(i128),
    Symbol(Symbol),
    /// Ordered, index-addressable list.
    Sequence(Arc<Sequence>),
    /// String/symbol keyed record, insertion order preserved.
    Record(Arc<Record>),
    /// Insertion-ordered set of unique values.
    Set(Arc<UniqueSet>),
    /// Insertion-ordered map with unique keys.
    Map(Arc<OrderedMap>),
    /// Fixed-width typed binary array.
    Buffer(Arc<Buffer>),
    /// Class instance: constructor identity plus plain projection.
    Tagged(Arc<Instance>),
    Function(Function),
}

/// Hashable identity of a value (SameValueZero).
///
/// Primitives are identified by content, containers and functions by address.
/// Addresses stay valid as long as the holder keeps the value alive, which
/// every collection indexing by this key does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Undefined,
    Null,
    Boolean(bool),
    Number(u64),
    String(Arc<str>),
    BigInt(i128),
    Symbol(u64),
    Ref(usize),
}

impl IdentityKey {
    pub fn number(n: f64) -> Self {
        let bits = if n.is_nan() {
            f64::NAN.to_bits()
        } else if n == 0.0 {
            0f64.to_bits()
        } else {
            n.to_bits()
        };
        IdentityKey::Number(bits)
    }
}

impl Value {
    /// Creates a string value.
    pub fn string(s: &str) -> Self {
        Value::String(Arc::from(s))
    }

    /// Returns true for `Null` and `Undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// Returns true for values that are not containers, instances or functions.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Undefined
                | Value::Null
                | Value::Boolean(_)
                | Value::Number(_)
                | Value::String(_)
                | Value::BigInt(_)
                | Value::Symbol(_)
        )
    }

    /// Returns true for plain records, the only kind merges recurse into.
    pub fn is_record(&self) -> bool {
        matches!(self, Value::Record(_))
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(rec) => Some(rec),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Value::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&UniqueSet> {
        match self {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&OrderedMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Tagged(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the plain-data record of a record or instance.
    pub fn plain(&self) -> Option<&Record> {
        match self {
            Value::Record(rec) => Some(rec),
            Value::Tagged(instance) => Some(instance.projection()),
            _ => None,
        }
    }

    /// Mutable access to the plain-data record of a record or instance.
    pub fn plain_mut(&mut self) -> Option<&mut Record> {
        match self {
            Value::Record(rec) => Some(Arc::make_mut(rec)),
            Value::Tagged(instance) => Some(Arc::make_mut(instance).projection_mut()),
            _ => None,
        }
    }

    /// Reads an own property of a record or instance projection.
    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        self.plain()?.get(&key.into())
    }

    /// Returns true if both values are the same node.
    ///
    /// Containers, instances and functions compare by address; primitives
    /// compare by SameValueZero.
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        a.identity_key() == b.identity_key()
    }

    /// The key under which sets and maps index this value.
    pub fn identity_key(&self) -> IdentityKey {
        fn addr<T: ?Sized>(arc: &Arc<T>) -> IdentityKey {
            IdentityKey::Ref(Arc::as_ptr(arc) as *const () as usize)
        }

        match self {
            Value::Undefined => IdentityKey::Undefined,
            Value::Null => IdentityKey::Null,
            Value::Boolean(b) => IdentityKey::Boolean(*b),
            Value::Number(n) => IdentityKey::number(*n),
            Value::String(s) => IdentityKey::String(s.clone()),
            Value::BigInt(i) => IdentityKey::BigInt(*i),
            Value::Symbol(sym) => IdentityKey::Symbol(sym.id()),
            Value::Sequence(seq) => addr(seq),
            Value::Record(rec) => addr(rec),
            Value::Set(set) => addr(set),
            Value::Map(map) => addr(map),
            Value::Buffer(buf) => addr(buf),
            Value::Tagged(instance) => addr(instance),
            Value::Function(func) => IdentityKey::Ref(func.addr()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Symbol> for Value {
    fn from(sym: Symbol) -> Self {
        Value::Symbol(sym)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

impl From<Record> for Value {
    fn from(rec: Record) -> Self {
        Value::Record(Arc::new(rec))
    }
}

impl From<Sequence> for Value {
    fn from(seq: Sequence) -> Self {
        Value::Sequence(Arc::new(seq))
    }
}

impl From<UniqueSet> for Value {
    fn from(set: UniqueSet) -> Self {
        Value::Set(Arc::new(set))
    }
}

impl From<OrderedMap> for Value {
    fn from(map: OrderedMap) -> Self {
        Value::Map(Arc::new(map))
    }
}

impl From<Buffer> for Value {
    fn from(buf: Buffer) -> Self {
        Value::Buffer(Arc::new(buf))
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Tagged(Arc::new(instance))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::from(items.into_iter().map(Into::into).collect::<Sequence>())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Undefined, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ptr_eq_containers() {
        let a = Value::from(vec!["x", "y"]);
        let shared = a.clone();
        let copy = Value::from(vec!["x", "y"]);
        assert!(Value::ptr_eq(&a, &shared));
        assert!(!Value::ptr_eq(&a, &copy));
    }

    #[test]
    fn test_ptr_eq_primitives() {
        assert!(Value::ptr_eq(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
        assert!(Value::ptr_eq(&Value::Number(0.0), &Value::Number(-0.0)));
        assert!(Value::ptr_eq(&Value::from("a"), &Value::from("a")));
        assert!(!Value::ptr_eq(&Value::Null, &Value::Undefined));
    }

    #[test]
    fn test_function_identity() {
        let f = Function::new("double", |args| match args.first() {
            Some(Value::Number(n)) => Value::Number(n * 2.0),
            _ => Value::Undefined,
        });
        let g = f.clone();
        assert!(f.ptr_eq(&g));
        assert_eq!(f.name(), "double");
        assert!(matches!(f.call(&[Value::Number(2.0)]), Value::Number(n) if n == 4.0));
    }
}
