//! Structural equality over value graphs.
//!
//! `==` on [`Value`] is deep equality with records, maps and sets compared
//! as unordered collections. The updater uses the ordered variant so that
//! a pure key reordering still counts as a change.

use crate::model::{OrderedMap, Record, UniqueSet, Value};

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        deep_equal(self, other)
    }
}

/// Deep equality ignoring record, map and set ordering.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    equal(a, b, false)
}

/// Deep equality that also requires identical key and member order.
pub fn deep_equal_ordered(a: &Value, b: &Value) -> bool {
    equal(a, b, true)
}

/// SameValueZero: content for primitives, identity for everything else.
pub fn same_value_zero(a: &Value, b: &Value) -> bool {
    Value::ptr_eq(a, b)
}

fn equal(a: &Value, b: &Value, ordered: bool) -> bool {
    if Value::ptr_eq(a, b) {
        return true;
    }
    match (a, b) {
        (Value::Sequence(x), Value::Sequence(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| equal(p, q, ordered))
        }
        (Value::Record(x), Value::Record(y)) => records_equal(x, y, ordered),
        (Value::Set(x), Value::Set(y)) => sets_equal(x, y, ordered),
        (Value::Map(x), Value::Map(y)) => maps_equal(x, y, ordered),
        (Value::Buffer(x), Value::Buffer(y)) => x == y,
        (Value::Tagged(x), Value::Tagged(y)) => {
            x.constructor().ptr_eq(y.constructor())
                && records_equal(x.projection(), y.projection(), ordered)
        }
        _ => false,
    }
}

fn records_equal(x: &Record, y: &Record, ordered: bool) -> bool {
    if x.len() != y.len() {
        return false;
    }
    if ordered {
        return x
            .iter()
            .zip(y.iter())
            .all(|((kx, vx), (ky, vy))| kx == ky && equal(vx, vy, true));
    }
    x.iter()
        .all(|(key, vx)| y.get(key).is_some_and(|vy| equal(vx, vy, false)))
}

fn sets_equal(x: &UniqueSet, y: &UniqueSet, ordered: bool) -> bool {
    if x.len() != y.len() {
        return false;
    }
    if ordered {
        return x.iter().zip(y.iter()).all(|(p, q)| equal(p, q, true));
    }
    let mut remaining: Vec<&Value> = y.iter().collect();
    x.iter().all(|p| take_match(&mut remaining, |q| equal(p, q, false)))
}

/// Removes the first candidate accepted by `matches`; each one is used once.
fn take_match<T>(remaining: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
    match remaining.iter().position(matches) {
        Some(pos) => {
            remaining.swap_remove(pos);
            true
        }
        None => false,
    }
}

fn maps_equal(x: &OrderedMap, y: &OrderedMap, ordered: bool) -> bool {
    if x.len() != y.len() {
        return false;
    }
    if ordered {
        return x
            .iter()
            .zip(y.iter())
            .all(|((kx, vx), (ky, vy))| equal(kx, ky, true) && equal(vx, vy, true));
    }
    let mut remaining: Vec<(&Value, &Value)> = y.iter().collect();
    x.iter().all(|(kx, vx)| {
        take_match(&mut remaining, |(ky, vy)| {
            equal(kx, ky, false) && equal(vx, vy, false)
        })
    })
}
