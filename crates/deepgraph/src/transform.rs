//! Deep merge, patch and update.
//!
//! All three fold `layers` left to right onto `base`:
//! - a record layer is interpreted by the directive language and merged
//!   into the accumulated record (a non-record accumulator starts over from
//!   an empty record)
//! - any other layer replaces the accumulated value outright
//!
//! They differ in what happens to `base`. [`merge_deep`] never touches it,
//! [`patch_deep`] edits it in place, and [`update_deep`] hands back `base`
//! itself when the fold changed nothing. The `*_clones_*` variants deep-clone
//! every value taken from a layer before attaching it.
//!
//! Every layer is parsed before the first one is applied, so a layer with a
//! bad directive fails the call with `base` untouched.

use std::sync::Arc;

use tracing::debug;

use crate::clone::clone_deep;
use crate::compare::deep_equal_ordered;
use crate::directive::{apply_layer, Attach, Layer};
use crate::error::Error;
use crate::model::{Key, Record, Value};

enum Step<'a> {
    Merge(Layer),
    Replace(&'a Value),
}

fn parse_steps(layers: &[Value]) -> Result<Vec<Step<'_>>, Error> {
    layers
        .iter()
        .map(|layer| match layer {
            Value::Record(rec) => Ok(Step::Merge(Layer::parse(rec)?)),
            other => Ok(Step::Replace(other)),
        })
        .collect()
}

/// Merges `layer` into `target`, first replacing a non-record target with
/// an empty record.
fn merge_into(target: &mut Value, layer: &Layer, attach: Attach) {
    if let Value::Record(rec) = target {
        apply_layer(Arc::make_mut(rec), layer, attach);
        return;
    }
    let mut fresh = Record::new();
    apply_layer(&mut fresh, layer, attach);
    *target = Value::from(fresh);
}

fn merge(base: &Value, layers: &[Value], attach: Attach) -> Result<Value, Error> {
    let steps = parse_steps(layers)?;
    debug!(layers = layers.len(), clones = attach == Attach::Clone, "merge");
    let mut acc = match (base, attach) {
        (Value::Record(_), Attach::Clone) => clone_deep(base),
        (Value::Record(rec), Attach::Reference) => Value::from((**rec).clone()),
        _ => Value::from(Record::new()),
    };
    for step in &steps {
        match step {
            Step::Merge(layer) => merge_into(&mut acc, layer, attach),
            Step::Replace(value) => acc = attach.attach(value),
        }
    }
    Ok(acc)
}

/// Folds `steps` into `base`.
///
/// Returns `None` when the result is `base` itself, or the detached result
/// when `base` was not a record or a layer replaced it.
fn patch(base: &mut Value, steps: &[Step<'_>], attach: Attach) -> Option<Value> {
    let mut detached = (!base.is_record()).then(|| Value::from(Record::new()));
    for step in steps {
        match step {
            Step::Merge(layer) => {
                let target = match detached.as_mut() {
                    Some(value) => value,
                    None => &mut *base,
                };
                merge_into(target, layer, attach);
            }
            Step::Replace(value) => detached = Some(attach.attach(value)),
        }
    }
    detached
}

fn patch_with(base: &mut Value, layers: &[Value], attach: Attach) -> Result<Value, Error> {
    let steps = parse_steps(layers)?;
    debug!(layers = layers.len(), clones = attach == Attach::Clone, "patch");
    Ok(patch(base, &steps, attach).unwrap_or_else(|| base.clone()))
}

fn update(base: &Value, layers: &[Value], attach: Attach) -> Result<Value, Error> {
    let steps = parse_steps(layers)?;
    let mut working = base.clone();
    let result = patch(&mut working, &steps, attach).unwrap_or(working);
    if deep_equal_ordered(&result, base) {
        debug!(layers = layers.len(), "update is a no-op");
        return Ok(base.clone());
    }
    debug!(layers = layers.len(), clones = attach == Attach::Clone, "update");
    Ok(stabilize(result, base))
}

/// Reattaches every subtree of `prev` that `next` reproduces unchanged.
fn stabilize(next: Value, prev: &Value) -> Value {
    if Value::ptr_eq(&next, prev) || deep_equal_ordered(&next, prev) {
        return prev.clone();
    }
    match (next, prev) {
        (Value::Record(mut rec), Value::Record(old)) => {
            let keys: Vec<Key> = rec.keys().cloned().collect();
            let rec_mut = Arc::make_mut(&mut rec);
            for key in keys {
                let (Some(slot), Some(old_child)) = (rec_mut.get_mut(&key), old.get(&key)) else {
                    continue;
                };
                let child = std::mem::take(slot);
                *slot = stabilize(child, old_child);
            }
            Value::Record(rec)
        }
        (Value::Sequence(mut seq), Value::Sequence(old)) => {
            let seq_mut = Arc::make_mut(&mut seq);
            for (slot, old_child) in seq_mut.iter_mut().zip(old.iter()) {
                let child = std::mem::take(slot);
                *slot = stabilize(child, old_child);
            }
            Value::Sequence(seq)
        }
        (next, _) => next,
    }
}

/// Merges `layers` into a copy of `base`. Inputs are never mutated.
///
/// Values taken from layers are shared with the result, except records,
/// which are merged into fresh records. A non-record `base` is discarded.
pub fn merge_deep(base: &Value, layers: &[Value]) -> Result<Value, Error> {
    merge(base, layers, Attach::Reference)
}

/// Like [`merge_deep`], but the result shares nothing with `base` or `layers`.
pub fn merge_clones_deep(base: &Value, layers: &[Value]) -> Result<Value, Error> {
    merge(base, layers, Attach::Clone)
}

/// Merges `layers` into `base` in place and returns a handle to the result.
///
/// If `base` is not a record, or a non-record layer replaces the result,
/// the result is built separately and `base` is left as it was.
pub fn patch_deep(base: &mut Value, layers: &[Value]) -> Result<Value, Error> {
    patch_with(base, layers, Attach::Reference)
}

/// Like [`patch_deep`], but values taken from layers are deep-cloned first.
pub fn patch_clones_deep(base: &mut Value, layers: &[Value]) -> Result<Value, Error> {
    patch_with(base, layers, Attach::Clone)
}

/// Patches a copy of `base`, returning `base` itself if nothing changed.
///
/// "Nothing changed" means deep equality including key order. When
/// something did change, the result still shares every untouched subtree
/// with `base`.
pub fn update_deep(base: &Value, layers: &[Value]) -> Result<Value, Error> {
    update(base, layers, Attach::Reference)
}

/// Like [`update_deep`], but values taken from layers are deep-cloned first.
pub fn update_clones_deep(base: &Value, layers: &[Value]) -> Result<Value, Error> {
    update(base, layers, Attach::Clone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constructor, OrderedMap, RecordBuilder, UniqueSet};

    /// A layer carrying a set, a map and an instance, each with a nested
    /// container inside.
    fn rich_layer() -> (Value, Value, Value, Value) {
        let member = Value::from(vec![1, 2]);
        let set = Value::from([member].into_iter().collect::<UniqueSet>());
        let map = Value::from(
            [(Value::from("k"), RecordBuilder::new().entry("v", 1).into_value())]
                .into_iter()
                .collect::<OrderedMap>(),
        );
        let point = RecordBuilder::new()
            .record("inner", |r| r.entry("x", 1))
            .into_instance(Constructor::class("Point"));
        let layer = RecordBuilder::new()
            .entry("set", set.clone())
            .record("nested", |r| r.entry("map", map.clone()).entry("point", point.clone()))
            .into_value();
        (layer, set, map, point)
    }

    fn assert_shares_nothing(out: &Value, set: &Value, map: &Value, point: &Value) {
        let out_set = out.get("set").unwrap();
        assert_eq!(out_set, set);
        assert!(!Value::ptr_eq(out_set, set));
        let out_member = out_set.as_set().unwrap().iter().next().unwrap();
        let member = set.as_set().unwrap().iter().next().unwrap();
        assert!(!Value::ptr_eq(out_member, member));

        let nested = out.get("nested").unwrap();
        let out_map = nested.get("map").unwrap();
        assert_eq!(out_map, map);
        assert!(!Value::ptr_eq(out_map, map));
        let out_entry = out_map.as_map().unwrap().get(&Value::from("k")).unwrap();
        let entry = map.as_map().unwrap().get(&Value::from("k")).unwrap();
        assert!(!Value::ptr_eq(out_entry, entry));

        let out_point = nested.get("point").unwrap();
        assert_eq!(out_point, point);
        assert!(!Value::ptr_eq(out_point, point));
        assert!(out_point
            .as_instance()
            .zip(point.as_instance())
            .is_some_and(|(a, b)| a.constructor().ptr_eq(b.constructor())));
        assert!(!Value::ptr_eq(out_point.get("inner").unwrap(), point.get("inner").unwrap()));
    }

    fn abc() -> Value {
        RecordBuilder::new()
            .entry("a", "a")
            .entry("b", "b")
            .entry("c", "c")
            .into_value()
    }

    fn bc() -> Value {
        RecordBuilder::new().entry("b", "b").entry("c", "c").into_value()
    }

    fn keys(value: &Value) -> Vec<String> {
        value.as_record().unwrap().keys().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_merge_does_not_mutate() {
        let base = abc();
        let layer = RecordBuilder::new().list("$unset", ["a"]).into_value();
        let merged = merge_deep(&base, &[layer.clone()]).unwrap();
        assert_eq!(merged, bc());
        assert_eq!(base, abc());
        assert_eq!(layer, RecordBuilder::new().list("$unset", ["a"]).into_value());
    }

    #[test]
    fn test_merge_nested_records() {
        let base = RecordBuilder::new()
            .record("cfg", |r| r.entry("x", 1).entry("y", 2))
            .into_value();
        let merged = merge_deep(
            &base,
            &[RecordBuilder::new().record("cfg", |r| r.entry("y", 3).entry("z", 4)).into_value()],
        )
        .unwrap();
        assert_eq!(
            merged,
            RecordBuilder::new()
                .record("cfg", |r| r.entry("x", 1).entry("y", 3).entry("z", 4))
                .into_value()
        );
        assert_eq!(base.get("cfg").and_then(|c| c.get("y")), Some(&Value::from(2)));
    }

    #[test]
    fn test_merge_attaches_by_reference() {
        let list = Value::from(vec![1, 2]);
        let layer = RecordBuilder::new().entry("list", list.clone()).into_value();

        let merged = merge_deep(&Value::Null, &[layer.clone()]).unwrap();
        assert!(Value::ptr_eq(merged.get("list").unwrap(), &list));

        let cloned = merge_clones_deep(&Value::Null, &[layer]).unwrap();
        assert!(!Value::ptr_eq(cloned.get("list").unwrap(), &list));
        assert_eq!(cloned.get("list"), Some(&list));
    }

    #[test]
    fn test_merge_clones_copies_sets_maps_and_instances() {
        let (layer, set, map, point) = rich_layer();
        let merged = merge_clones_deep(&abc(), &[layer.clone()]).unwrap();
        assert_shares_nothing(&merged, &set, &map, &point);

        let by_ref = merge_deep(&abc(), &[layer]).unwrap();
        assert!(Value::ptr_eq(by_ref.get("set").unwrap(), &set));
    }

    #[test]
    fn test_patch_clones_copies_sets_maps_and_instances() {
        let (layer, set, map, point) = rich_layer();
        let mut base = abc();
        let patched = patch_clones_deep(&mut base, &[layer]).unwrap();
        assert!(Value::ptr_eq(&patched, &base));
        assert_shares_nothing(&patched, &set, &map, &point);
    }

    #[test]
    fn test_merge_set_dotted_path() {
        let base = RecordBuilder::new().record("a", |r| r.entry("b", 1)).into_value();
        let layer = RecordBuilder::new().record("$set", |r| r.entry("a.c", 2)).into_value();
        let merged = merge_deep(&base, &[layer]).unwrap();
        assert_eq!(merged.get("a").and_then(|a| a.get("c")), Some(&Value::from(2)));
        assert_eq!(merged.get("a").and_then(|a| a.get("b")), Some(&Value::from(1)));
        assert_eq!(merged.get("a.c"), None);
        assert_eq!(base.get("a").and_then(|a| a.get("c")), None);
    }

    #[test]
    fn test_merge_clones_shares_nothing_with_base() {
        let base = RecordBuilder::new().record("inner", |r| r.entry("x", 1)).into_value();
        let merged = merge_clones_deep(&base, &[]).unwrap();
        assert_eq!(merged, base);
        assert!(!Value::ptr_eq(merged.get("inner").unwrap(), base.get("inner").unwrap()));
    }

    #[test]
    fn test_merge_sequences_replace() {
        let base = RecordBuilder::new().list("items", [1, 2, 3]).into_value();
        let merged =
            merge_deep(&base, &[RecordBuilder::new().list("items", [9]).into_value()]).unwrap();
        assert_eq!(merged.get("items"), Some(&Value::from(vec![9])));
    }

    #[test]
    fn test_degrade_to_replacement() {
        let base = RecordBuilder::new().entry("a", "a").into_value();
        let layers = [
            RecordBuilder::new().entry("b", "b").into_value(),
            RecordBuilder::new().entry("c", "c").into_value(),
            Value::Null,
        ];
        assert_eq!(merge_deep(&base, &layers).unwrap(), Value::Null);

        let list = Value::from(vec!["a", "b", "c"]);
        assert_eq!(merge_deep(&base, &[list.clone()]).unwrap(), list);
        assert_eq!(merge_deep(&base, &[Value::from(5)]).unwrap(), Value::from(5));
    }

    #[test]
    fn test_record_after_replacement_starts_fresh() {
        let base = abc();
        let layers = [Value::from(vec![1]), RecordBuilder::new().entry("d", "d").into_value()];
        assert_eq!(
            merge_deep(&base, &layers).unwrap(),
            RecordBuilder::new().entry("d", "d").into_value()
        );
    }

    #[test]
    fn test_non_record_base_is_discarded() {
        let merged = merge_deep(
            &Value::from(vec![1, 2]),
            &[RecordBuilder::new().entry("a", 1).into_value()],
        )
        .unwrap();
        assert_eq!(merged, RecordBuilder::new().entry("a", 1).into_value());
        assert_eq!(merge_deep(&Value::Undefined, &[]).unwrap(), Value::from(Record::new()));
    }

    #[test]
    fn test_invalid_layer_is_atomic() {
        let mut base = abc();
        let layers = [
            RecordBuilder::new().list("$unset", ["a"]).into_value(),
            RecordBuilder::new().entry("$bogus", 1).into_value(),
        ];
        let err = patch_deep(&mut base, &layers).unwrap_err();
        assert_eq!(err, Error::UnknownDirective { key: "$bogus".into() });
        assert_eq!(base, abc());
        assert!(merge_deep(&base, &layers).is_err());
        assert!(update_deep(&base, &layers).is_err());
    }

    #[test]
    fn test_patch_mutates_base() {
        let mut base = abc();
        let result =
            patch_deep(&mut base, &[RecordBuilder::new().list("$unset", ["a"]).into_value()])
                .unwrap();
        assert_eq!(result, bc());
        assert_eq!(base, bc());
        assert!(Value::ptr_eq(&result, &base));
    }

    #[test]
    fn test_patch_key_sort_order() {
        let mut base = abc();
        patch_deep(
            &mut base,
            &[RecordBuilder::new().list("$keySortOrder", ["c", "a", "b"]).into_value()],
        )
        .unwrap();
        assert_eq!(keys(&base), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_patch_non_record_base_builds_fresh() {
        let mut base = Value::from(vec![1]);
        let result =
            patch_deep(&mut base, &[RecordBuilder::new().entry("a", 1).into_value()]).unwrap();
        assert_eq!(result, RecordBuilder::new().entry("a", 1).into_value());
        assert_eq!(base, Value::from(vec![1]));
    }

    #[test]
    fn test_patch_replacement_leaves_base() {
        let mut base = abc();
        let result = patch_deep(
            &mut base,
            &[RecordBuilder::new().entry("d", "d").into_value(), Value::Null],
        )
        .unwrap();
        assert_eq!(result, Value::Null);
        assert!(base.get("d").is_some());
    }

    #[test]
    fn test_patch_clones_detaches_values() {
        let mut base = abc();
        let list = Value::from(vec![1]);
        patch_clones_deep(&mut base, &[RecordBuilder::new().entry("l", list.clone()).into_value()])
            .unwrap();
        assert_eq!(base.get("l"), Some(&list));
        assert!(!Value::ptr_eq(base.get("l").unwrap(), &list));
    }

    #[test]
    fn test_update_returns_base_on_no_op() {
        let base = abc();
        let same = update_deep(&base, &[abc()]).unwrap();
        assert!(Value::ptr_eq(&same, &base));

        let changed =
            update_deep(&base, &[RecordBuilder::new().entry("d", "d").into_value()]).unwrap();
        assert!(!Value::ptr_eq(&changed, &base));
        assert_eq!(changed.get("d"), Some(&Value::from("d")));
        assert_eq!(base, abc());
    }

    #[test]
    fn test_update_reorder_is_a_change() {
        let base = abc();
        let sorted = update_deep(
            &base,
            &[RecordBuilder::new().list("$keySortOrder", ["c", "a", "b"]).into_value()],
        )
        .unwrap();
        assert!(!Value::ptr_eq(&sorted, &base));
        assert_eq!(keys(&sorted), vec!["c", "a", "b"]);
        assert_eq!(keys(&base), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_update_keeps_untouched_subtrees() {
        let base = RecordBuilder::new()
            .record("left", |r| r.entry("x", 1))
            .record("right", |r| r.entry("y", 1))
            .into_value();
        let next = update_deep(
            &base,
            &[RecordBuilder::new()
                .record("left", |r| r.entry("x", 2))
                .record("right", |r| r.entry("y", 1))
                .into_value()],
        )
        .unwrap();
        assert!(!Value::ptr_eq(next.get("left").unwrap(), base.get("left").unwrap()));
        assert!(Value::ptr_eq(next.get("right").unwrap(), base.get("right").unwrap()));
    }

    #[test]
    fn test_update_clones_restores_equal_sequences() {
        let base = RecordBuilder::new().list("items", [1, 2]).entry("n", 1).into_value();
        let next = update_clones_deep(
            &base,
            &[RecordBuilder::new().list("items", [1, 2]).entry("n", 2).into_value()],
        )
        .unwrap();
        assert!(Value::ptr_eq(next.get("items").unwrap(), base.get("items").unwrap()));
        assert_eq!(next.get("n"), Some(&Value::from(2)));
    }

    #[test]
    fn test_update_across_kinds() {
        let set: UniqueSet = ["a", "b", "c"].into_iter().map(Value::from).collect();
        let base = Value::from(set);
        let next = update_deep(&base, &[abc()]).unwrap();
        assert_eq!(next, abc());
        assert!(next.is_record());
        assert_eq!(base.as_set().map(UniqueSet::len), Some(3));
    }

    #[test]
    fn test_pick_matches_unset_complement() {
        let base = abc();
        let picked = merge_deep(&base, &[RecordBuilder::new().list("$pick", ["a"]).into_value()]);
        let left = merge_deep(&base, &[RecordBuilder::new().list("$leave", ["a"]).into_value()]);
        let unset = merge_deep(&base, &[RecordBuilder::new().list("$unset", ["b", "c"]).into_value()]);
        let omitted = merge_deep(&base, &[RecordBuilder::new().list("$omit", ["b", "c"]).into_value()]);
        let expected = RecordBuilder::new().entry("a", "a").into_value();
        for result in [picked, left, unset, omitted] {
            assert_eq!(result.unwrap(), expected);
        }
    }

    #[test]
    fn test_layers_apply_in_order() {
        let base = RecordBuilder::new().list("tags", ["x"]).into_value();
        let merged = merge_deep(
            &base,
            &[
                RecordBuilder::new().record("$push", |r| r.entry("tags", "y")).into_value(),
                RecordBuilder::new().record("$pull", |r| r.entry("tags", "x")).into_value(),
                RecordBuilder::new().record("$default", |r| r.entry("tags", "z")).into_value(),
            ],
        )
        .unwrap();
        assert_eq!(merged.get("tags"), Some(&Value::from(vec!["y"])));
        assert_eq!(base.get("tags"), Some(&Value::from(vec!["x"])));
    }
}
