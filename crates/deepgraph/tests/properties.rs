//! Property tests for the transform invariants.

use deepgraph::{
    clone, clone_deep, deep_equal_ordered, merge_deep, omit, patch_deep, pick, tags, update_deep,
    Record, RecordBuilder, Sequence, TransformOptions, UniqueSet, Value,
};
use proptest::prelude::*;

const FIELDS: [&str; 4] = ["a", "b", "c", "d"];

fn arb_field() -> impl Strategy<Value = &'static str> {
    prop::sample::select(FIELDS.to_vec())
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(Value::Undefined),
        any::<bool>().prop_map(Value::from),
        (-100i32..100).prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|items| Value::from(items.into_iter().collect::<Sequence>())),
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|items| Value::from(items.into_iter().collect::<UniqueSet>())),
            prop::collection::vec((arb_field(), inner), 0..4)
                .prop_map(|entries| Value::from(entries.into_iter().collect::<Record>())),
        ]
    })
}

fn arb_record() -> impl Strategy<Value = Value> {
    prop::collection::vec((arb_field(), arb_value()), 0..5)
        .prop_map(|entries| Value::from(entries.into_iter().collect::<Record>()))
}

fn arb_keys() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(FIELDS.to_vec(), 0..=FIELDS.len())
}

fn complement(keys: &[&'static str]) -> Vec<&'static str> {
    FIELDS.iter().copied().filter(|k| !keys.contains(k)).collect()
}

fn key_values(keys: &[&'static str]) -> Vec<Value> {
    keys.iter().map(|k| Value::from(*k)).collect()
}

proptest! {
    #[test]
    fn test_merge_never_mutates_inputs(base in arb_record(), layer in arb_record()) {
        let base_before = clone_deep(&base);
        let layer_before = clone_deep(&layer);
        let _ = merge_deep(&base, &[layer.clone()]).unwrap();
        prop_assert!(deep_equal_ordered(&base, &base_before));
        prop_assert!(deep_equal_ordered(&layer, &layer_before));
    }

    #[test]
    fn test_clone_keeps_tags_and_content(value in arb_value()) {
        let deep = clone_deep(&value);
        prop_assert_eq!(tags(&deep), tags(&value));
        prop_assert!(deep_equal_ordered(&deep, &value));
        let shallow = clone(&value);
        prop_assert_eq!(tags(&shallow), tags(&value));
        prop_assert!(deep_equal_ordered(&shallow, &value));
    }

    #[test]
    fn test_update_with_equal_layer_keeps_reference(base in arb_record()) {
        let same = update_deep(&base, &[base.clone()]).unwrap();
        prop_assert!(Value::ptr_eq(&same, &base));
        let copied = update_deep(&base, &[clone_deep(&base)]).unwrap();
        prop_assert!(Value::ptr_eq(&copied, &base));
    }

    #[test]
    fn test_update_agrees_with_merge(base in arb_record(), layer in arb_record()) {
        let merged = merge_deep(&base, &[layer.clone()]).unwrap();
        let updated = update_deep(&base, &[layer]).unwrap();
        prop_assert!(deep_equal_ordered(&merged, &updated));
        if deep_equal_ordered(&merged, &base) {
            prop_assert!(Value::ptr_eq(&updated, &base));
        }
    }

    #[test]
    fn test_patch_agrees_with_merge(base in arb_record(), layer in arb_record()) {
        let merged = merge_deep(&base, &[layer.clone()]).unwrap();
        let mut target = base.clone();
        let patched = patch_deep(&mut target, &[layer]).unwrap();
        prop_assert!(deep_equal_ordered(&merged, &patched));
        prop_assert!(deep_equal_ordered(&target, &patched));
    }

    #[test]
    fn test_pick_and_unset_are_complements(base in arb_record(), keys in arb_keys()) {
        let rest = complement(&keys);
        let picked = merge_deep(&base, &[RecordBuilder::new().list("$pick", keys.clone()).into_value()]).unwrap();
        let left = merge_deep(&base, &[RecordBuilder::new().list("$leave", keys.clone()).into_value()]).unwrap();
        let unset = merge_deep(&base, &[RecordBuilder::new().list("$unset", rest.clone()).into_value()]).unwrap();
        let omitted = merge_deep(&base, &[RecordBuilder::new().list("$omit", rest.clone()).into_value()]).unwrap();
        prop_assert!(deep_equal_ordered(&picked, &left));
        prop_assert!(deep_equal_ordered(&picked, &unset));
        prop_assert!(deep_equal_ordered(&picked, &omitted));

        let mut source = base.clone();
        let selected = pick(&mut source, &key_values(&keys), TransformOptions::new()).unwrap();
        let dropped = omit(&mut source, &key_values(&rest), TransformOptions::new()).unwrap();
        prop_assert!(deep_equal_ordered(&selected, &dropped));
        prop_assert!(deep_equal_ordered(&selected, &picked));
        prop_assert!(Value::ptr_eq(&source, &base));
    }
}
