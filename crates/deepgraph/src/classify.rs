//! Type classification: tags, constructors and prototype chains.
//!
//! Every value has a primary tag (`"Object"`, `"Array"`, `"Map"`,
//! `"Object:Point"`, ...) and, for non-primitives, an ancestor chain that
//! ends in `"Object"`. All functions here are pure.

use crate::model::{builtins, Constructor, Value};

/// A step up a value's prototype chain.
#[derive(Debug, Clone)]
pub enum Prototype {
    /// Level zero: the value itself.
    Own(Value),
    /// The prototype object owned by this constructor.
    Of(Constructor),
}

impl Prototype {
    /// The constructor this prototype belongs to.
    pub fn constructor(&self) -> Option<Constructor> {
        match self {
            Prototype::Own(value) => c9r(value),
            Prototype::Of(ctor) => Some(ctor.clone()),
        }
    }
}

/// Returns the most specific tag of `value`.
pub fn tag(value: &Value) -> String {
    match value {
        Value::Undefined => "Undefined".to_string(),
        Value::Null => "Null".to_string(),
        _ => c9r(value).map_or_else(|| "Object".to_string(), |ctor| ctor.tag()),
    }
}

/// Returns the full tag chain of `value`, most specific first.
///
/// Primitives, `Null` and `Undefined` yield a single tag; everything else
/// walks its constructor chain down to `"Object"`.
pub fn tags(value: &Value) -> Vec<String> {
    if value.is_primitive() {
        return vec![tag(value)];
    }
    match c9r(value) {
        Some(ctor) => ctor.ancestors().map(|c| c.tag()).collect(),
        None => vec![tag(value)],
    }
}

/// Returns the constructor owning `value`, or `None` for `Null`/`Undefined`.
pub fn c9r(value: &Value) -> Option<Constructor> {
    let ctor = match value {
        Value::Undefined | Value::Null => return None,
        Value::Boolean(_) => builtins::boolean(),
        Value::Number(_) => builtins::number(),
        Value::String(_) => builtins::string(),
        Value::BigInt(_) => builtins::bigint(),
        Value::Symbol(_) => builtins::symbol(),
        Value::Sequence(_) => builtins::array(),
        Value::Record(_) => builtins::object(),
        Value::Set(_) => builtins::set(),
        Value::Map(_) => builtins::map(),
        Value::Buffer(buf) => builtins::typed_array_of(buf.kind()),
        Value::Tagged(instance) => instance.constructor().clone(),
        Value::Function(_) => builtins::function(),
    };
    Some(ctor)
}

/// Walks `levels` steps up the prototype chain of `value`.
///
/// Level 0 is the value itself, level 1 the prototype of its constructor.
/// Returns `None` past the end of the chain.
pub fn proto(value: &Value, levels: usize) -> Option<Prototype> {
    if levels == 0 {
        return Some(Prototype::Own(value.clone()));
    }
    c9r(value)?.ancestors().nth(levels - 1).map(Prototype::Of)
}

/// The constructor of the prototype `levels` steps up from `value`.
pub fn proto_c9r(value: &Value, levels: usize) -> Option<Constructor> {
    proto(value, levels)?.constructor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Buffer, BufferKind, Function, OrderedMap, Record, RecordBuilder, UniqueSet};

    #[test]
    fn test_primitive_tags() {
        assert_eq!(tag(&Value::Null), "Null");
        assert_eq!(tag(&Value::Undefined), "Undefined");
        assert_eq!(tag(&Value::from("x")), "String");
        assert_eq!(tag(&Value::from(1)), "Number");
        assert_eq!(tag(&Value::BigInt(1)), "BigInt");
        assert_eq!(tags(&Value::from(true)), vec!["Boolean"]);
        assert_eq!(tags(&Value::Null), vec!["Null"]);
    }

    #[test]
    fn test_container_tags() {
        assert_eq!(tags(&Value::from(Record::new())), vec!["Object"]);
        assert_eq!(tags(&Value::from(vec![1])), vec!["Array", "Object"]);
        assert_eq!(tags(&Value::from(UniqueSet::new())), vec!["Set", "Object"]);
        assert_eq!(tags(&Value::from(OrderedMap::new())), vec!["Map", "Object"]);
        assert_eq!(
            tags(&Value::from(Buffer::new(BufferKind::Uint8, 4))),
            vec!["Uint8Array", "TypedArray", "Object"]
        );
        let f = Function::new("noop", |_| Value::Undefined);
        assert_eq!(tags(&Value::from(f)), vec!["Function", "Object"]);
    }

    #[test]
    fn test_class_tags() {
        let base = Constructor::class("Base").with_string_tag("BaseTag");
        let sub = base.subclass("Sub");
        let value = RecordBuilder::new().entry("x", 1).into_instance(sub);
        assert_eq!(tag(&value), "Object:Sub");
        assert_eq!(tags(&value), vec!["Object:Sub", "BaseTag", "Object"]);

        let anon = RecordBuilder::new().into_instance(Constructor::anonymous());
        assert_eq!(tag(&anon), "Object:?");
        assert_eq!(tag(&builtins::url_value("https://example.com/")), "URL");
        assert_eq!(tag(&builtins::date_value(0.0)), "Date");
    }

    #[test]
    fn test_c9r() {
        assert!(c9r(&Value::Null).is_none());
        assert!(c9r(&Value::Undefined).is_none());
        assert!(c9r(&Value::from(vec![1])).is_some_and(|c| c.ptr_eq(&builtins::array())));
        let point = Constructor::class("Point");
        let value = RecordBuilder::new().into_instance(point.clone());
        assert!(c9r(&value).is_some_and(|c| c.ptr_eq(&point)));
    }

    #[test]
    fn test_proto_levels() {
        let base = Constructor::class("Base");
        let sub = base.subclass("Sub");
        let value = RecordBuilder::new().into_instance(sub.clone());

        assert!(matches!(proto(&value, 0), Some(Prototype::Own(_))));
        assert!(proto_c9r(&value, 0).is_some_and(|c| c.ptr_eq(&sub)));
        assert!(proto_c9r(&value, 1).is_some_and(|c| c.ptr_eq(&sub)));
        assert!(proto_c9r(&value, 2).is_some_and(|c| c.ptr_eq(&base)));
        assert!(proto_c9r(&value, 3).is_some_and(|c| c.ptr_eq(&builtins::object())));
        assert!(proto(&value, 4).is_none());

        let plain = Value::from(Record::new());
        assert!(proto_c9r(&plain, 1).is_some_and(|c| c.ptr_eq(&builtins::object())));
        assert!(proto(&plain, 2).is_none());
        assert!(proto(&Value::Null, 1).is_none());
    }
}
