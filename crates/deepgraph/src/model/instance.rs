//! Constructors and class instances.
//!
//! A [`Constructor`] stands in for a class: a name, an optional string-tag
//! hook and a parent. An [`Instance`] pairs a constructor with the plain
//! [`Record`] projection that clone and merge operate on.

use std::fmt;
use std::sync::Arc;

use crate::model::{BufferKind, Record, Value};

#[derive(Debug)]
struct ConstructorDef {
    name: Option<Arc<str>>,
    string_tag: Option<Arc<str>>,
    parent: Option<Constructor>,
    builtin: bool,
}

/// A class-like constructor. Identity is by address.
#[derive(Clone)]
pub struct Constructor(Arc<ConstructorDef>);

impl Constructor {
    fn define(
        name: Option<Arc<str>>,
        string_tag: Option<Arc<str>>,
        parent: Option<Constructor>,
        builtin: bool,
    ) -> Self {
        Constructor(Arc::new(ConstructorDef {
            name,
            string_tag,
            parent,
            builtin,
        }))
    }

    fn builtin(name: &str, parent: Option<Constructor>) -> Self {
        Self::define(Some(Arc::from(name)), None, parent, true)
    }

    /// Declares a named class extending `Object`.
    pub fn class(name: &str) -> Self {
        Self::define(Some(Arc::from(name)), None, Some(builtins::object()), false)
    }

    /// Declares an anonymous class extending `Object`.
    pub fn anonymous() -> Self {
        Self::define(None, None, Some(builtins::object()), false)
    }

    /// Declares a named class extending this one.
    pub fn subclass(&self, name: &str) -> Self {
        Self::define(Some(Arc::from(name)), None, Some(self.clone()), false)
    }

    /// Returns a copy of this class declaration carrying a string-tag hook.
    ///
    /// The result is a new constructor; call it while declaring the class.
    pub fn with_string_tag(self, tag: &str) -> Self {
        Self::define(
            self.0.name.clone(),
            Some(Arc::from(tag)),
            self.0.parent.clone(),
            self.0.builtin,
        )
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn string_tag(&self) -> Option<&str> {
        self.0.string_tag.as_deref()
    }

    pub fn parent(&self) -> Option<&Constructor> {
        self.0.parent.as_ref()
    }

    pub fn is_builtin(&self) -> bool {
        self.0.builtin
    }

    /// The tag instances of exactly this constructor carry.
    ///
    /// Built-ins tag with their name. Classes use their string-tag hook,
    /// else `Object:<name>`, else `Object:?` when anonymous.
    pub fn tag(&self) -> String {
        if let Some(tag) = self.string_tag() {
            return tag.to_string();
        }
        match (self.is_builtin(), self.name()) {
            (true, Some(name)) => name.to_string(),
            (_, Some(name)) if !name.is_empty() => format!("Object:{name}"),
            _ => "Object:?".to_string(),
        }
    }

    /// Iterates this constructor and its ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = Constructor> {
        std::iter::successors(Some(self.clone()), |ctor| ctor.parent().cloned())
    }

    pub fn ptr_eq(&self, other: &Constructor) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Constructor {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Constructor {}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constructor({})", self.name().unwrap_or("?"))
    }
}

/// A class instance: its constructor plus its plain-data projection.
#[derive(Debug, Clone)]
pub struct Instance {
    constructor: Constructor,
    projection: Record,
}

impl Instance {
    pub fn new(constructor: Constructor, projection: Record) -> Self {
        Self {
            constructor,
            projection,
        }
    }

    pub fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    pub fn projection(&self) -> &Record {
        &self.projection
    }

    pub fn projection_mut(&mut self) -> &mut Record {
        &mut self.projection
    }

    pub fn into_projection(self) -> Record {
        self.projection
    }
}

/// Types that can enter the graph as class instances.
///
/// Implementors name their constructor and hand over the plain data the
/// engine clones and merges.
pub trait Projectable {
    fn constructor(&self) -> Constructor;

    fn project(&self) -> Record;

    fn to_value(&self) -> Value {
        Value::from(Instance::new(self.constructor(), self.project()))
    }
}

/// Process-wide built-in constructors.
pub mod builtins {
    use lazy_static::lazy_static;

    use super::{BufferKind, Constructor, Instance, Record, Value};

    lazy_static! {
        static ref OBJECT: Constructor = Constructor::builtin("Object", None);
        static ref FUNCTION: Constructor = Constructor::builtin("Function", Some(object()));
        static ref ARRAY: Constructor = Constructor::builtin("Array", Some(object()));
        static ref SET: Constructor = Constructor::builtin("Set", Some(object()));
        static ref MAP: Constructor = Constructor::builtin("Map", Some(object()));
        static ref BOOLEAN: Constructor = Constructor::builtin("Boolean", Some(object()));
        static ref NUMBER: Constructor = Constructor::builtin("Number", Some(object()));
        static ref STRING: Constructor = Constructor::builtin("String", Some(object()));
        static ref BIGINT: Constructor = Constructor::builtin("BigInt", Some(object()));
        static ref SYMBOL: Constructor = Constructor::builtin("Symbol", Some(object()));
        static ref TYPED_ARRAY: Constructor = Constructor::builtin("TypedArray", Some(object()));
        static ref TYPED_ARRAYS: Vec<Constructor> = BufferKind::ALL
            .iter()
            .map(|kind| Constructor::builtin(kind.name(), Some(typed_array())))
            .collect();
        static ref DATE: Constructor = Constructor::builtin("Date", Some(object()));
        static ref URL: Constructor = Constructor::builtin("URL", Some(object()));
    }

    pub fn object() -> Constructor {
        OBJECT.clone()
    }

    pub fn function() -> Constructor {
        FUNCTION.clone()
    }

    pub fn array() -> Constructor {
        ARRAY.clone()
    }

    pub fn set() -> Constructor {
        SET.clone()
    }

    pub fn map() -> Constructor {
        MAP.clone()
    }

    pub fn boolean() -> Constructor {
        BOOLEAN.clone()
    }

    pub fn number() -> Constructor {
        NUMBER.clone()
    }

    pub fn string() -> Constructor {
        STRING.clone()
    }

    pub fn bigint() -> Constructor {
        BIGINT.clone()
    }

    pub fn symbol() -> Constructor {
        SYMBOL.clone()
    }

    /// Common parent of every typed-array constructor.
    pub fn typed_array() -> Constructor {
        TYPED_ARRAY.clone()
    }

    /// The constructor of buffers of `kind`.
    pub fn typed_array_of(kind: BufferKind) -> Constructor {
        TYPED_ARRAYS[kind as usize].clone()
    }

    pub fn date() -> Constructor {
        DATE.clone()
    }

    pub fn url() -> Constructor {
        URL.clone()
    }

    /// A `Date` instance at `epoch_ms` milliseconds since the Unix epoch.
    pub fn date_value(epoch_ms: f64) -> Value {
        let projection: Record = [("time", epoch_ms)].into_iter().collect();
        Value::from(Instance::new(date(), projection))
    }

    /// A `URL` instance for `href`.
    pub fn url_value(href: &str) -> Value {
        let projection: Record = [("href", href)].into_iter().collect();
        Value::from(Instance::new(url(), projection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_tags() {
        assert_eq!(builtins::array().tag(), "Array");
        assert_eq!(Constructor::class("Point").tag(), "Object:Point");
        assert_eq!(Constructor::anonymous().tag(), "Object:?");
        assert_eq!(Constructor::class("Point").with_string_tag("Vec2").tag(), "Vec2");
    }

    #[test]
    fn test_ancestors() {
        let base = Constructor::class("Base");
        let sub = base.subclass("Sub");
        let names: Vec<String> = sub.ancestors().map(|c| c.tag()).collect();
        assert_eq!(names, vec!["Object:Sub", "Object:Base", "Object"]);
    }

    #[test]
    fn test_builtins_are_singletons() {
        assert!(builtins::object().ptr_eq(&builtins::object()));
        assert!(builtins::typed_array_of(BufferKind::Uint8).ptr_eq(&builtins::typed_array_of(BufferKind::Uint8)));
        assert_eq!(builtins::typed_array_of(BufferKind::Float32).tag(), "Float32Array");
        assert!(!Constructor::class("A").ptr_eq(&Constructor::class("A")));
    }

    struct Point {
        x: f64,
        y: f64,
    }

    impl Projectable for Point {
        fn constructor(&self) -> Constructor {
            lazy_static::lazy_static! {
                static ref POINT: Constructor = Constructor::class("Point");
            }
            POINT.clone()
        }

        fn project(&self) -> Record {
            [("x", self.x), ("y", self.y)].into_iter().collect()
        }
    }

    #[test]
    fn test_projectable() {
        let a = Point { x: 1.0, y: 2.0 }.to_value();
        let b = Point { x: 3.0, y: 4.0 }.to_value();
        let (Some(a), Some(b)) = (a.as_instance(), b.as_instance()) else {
            panic!("expected instances");
        };
        assert!(a.constructor().ptr_eq(b.constructor()));
        assert_eq!(a.projection().len(), 2);
    }
}
