//! Benchmark for deepgraph transforms over a reducer-style state tree.
//!
//! Usage: `bench-state-tree [state.json] [iterations]`. Without a file a
//! synthetic tree of users, settings and tag lists is generated.

use std::fs;
use std::time::{Duration, Instant};

use deepgraph::{
    clone_deep, merge_deep, patch_deep, update_deep, OrderedMap, Record, RecordBuilder, Sequence,
    Value,
};

const DEFAULT_ITERS: u32 = 100;
const SYNTHETIC_USERS: usize = 5_000;

// =============================================================================
// INPUT
// =============================================================================

/// Converts parsed JSON into a graph value.
fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::from(*b),
        serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::from),
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Array(items) => {
            Value::from(items.iter().map(from_json).collect::<Sequence>())
        }
        serde_json::Value::Object(fields) => Value::from(
            fields
                .iter()
                .map(|(key, value)| (key.as_str(), from_json(value)))
                .collect::<Record>(),
        ),
    }
}

fn synthetic_state(users: usize) -> Value {
    let mut table = Record::with_capacity(users);
    for i in 0..users {
        let user = RecordBuilder::new()
            .entry("id", i as i64)
            .entry("name", format!("user-{i}"))
            .entry("active", i % 3 != 0)
            .record("settings", |s| {
                s.entry("theme", if i % 2 == 0 { "dark" } else { "light" })
                    .entry("locale", "en-US")
                    .record("notifications", |n| n.entry("email", true).entry("push", false))
            })
            .list("tags", ["alpha", "beta"])
            .into_value();
        table.insert(format!("u{i}"), user);
    }
    let index: OrderedMap = (0..users.min(64))
        .map(|i| (Value::from(i as i64), Value::from(format!("u{i}"))))
        .collect();
    RecordBuilder::new()
        .entry("users", table)
        .entry("index", index)
        .record("session", |s| s.entry("token", "abc").entry("expires", 3_600))
        .into_value()
}

fn count_nodes(value: &Value) -> usize {
    1 + match value {
        Value::Record(rec) => rec.values().map(count_nodes).sum(),
        Value::Sequence(seq) => seq.iter().map(count_nodes).sum(),
        Value::Set(set) => set.iter().map(count_nodes).sum(),
        Value::Map(map) => map.values().map(count_nodes).sum(),
        Value::Tagged(instance) => instance.projection().values().map(count_nodes).sum(),
        _ => 0,
    }
}

// =============================================================================
// TIMING
// =============================================================================

fn time<F: FnMut() -> Value>(iters: u32, mut f: F) -> (Duration, Value) {
    for _ in 0..3 {
        let _ = f();
    }
    let start = Instant::now();
    let mut last = Value::Undefined;
    for _ in 0..iters {
        last = f();
    }
    (start.elapsed() / iters, last)
}

fn report(label: &str, avg: Duration, nodes: usize, iters: u32) {
    println!("\n{}: {:?} (avg of {} iterations)", label, avg, iters);
    println!(
        "  Throughput: {:.2} M nodes/s",
        (nodes as f64 / 1_000_000.0) / avg.as_secs_f64()
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let data_path = args.next();
    let iters = args
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(DEFAULT_ITERS)
        .max(1);

    let state = match &data_path {
        Some(path) => {
            println!("Loading state from: {}", path);
            let json_data = fs::read_to_string(path).expect("Failed to read state file");
            let parse_start = Instant::now();
            let json: serde_json::Value =
                serde_json::from_str(&json_data).expect("Failed to parse JSON");
            let state = from_json(&json);
            println!("Parsed and converted in {:?}", parse_start.elapsed());
            state
        }
        None => {
            println!("Generating synthetic state with {} users", SYNTHETIC_USERS);
            synthetic_state(SYNTHETIC_USERS)
        }
    };
    let nodes = count_nodes(&state);
    println!("State tree: {} nodes", nodes);
    tracing::info!(nodes, iters, "benchmark starting");

    // Deep clone
    let (clone_time, cloned) = time(iters, || clone_deep(&state));
    report("clone_deep", clone_time, nodes, iters);
    assert_eq!(cloned, state);

    // Merge a small change; everything else stays shared
    let change = RecordBuilder::new()
        .record("session", |s| s.entry("token", "xyz"))
        .record("$push", |p| p.entry("log", "login"))
        .into_value();
    let (merge_time, merged) = time(iters, || {
        merge_deep(&state, std::slice::from_ref(&change)).expect("Failed to merge")
    });
    report("merge_deep (small change)", merge_time, nodes, iters);
    assert_eq!(state.get("session").and_then(|s| s.get("token")), Some(&Value::from("abc")));
    assert_eq!(merged.get("session").and_then(|s| s.get("token")), Some(&Value::from("xyz")));

    // Merge the whole state onto itself
    let (self_merge_time, _) = time(iters, || {
        merge_deep(&state, std::slice::from_ref(&state)).expect("Failed to merge")
    });
    report("merge_deep (full layer)", self_merge_time, nodes, iters);

    // Patch a private copy in place
    let (patch_time, patched) = time(iters, || {
        let mut target = state.clone();
        patch_deep(&mut target, std::slice::from_ref(&change)).expect("Failed to patch")
    });
    report("patch_deep (small change)", patch_time, nodes, iters);
    assert_eq!(patched, merged);

    // Update with a layer that changes nothing
    let (noop_time, same) = time(iters, || {
        update_deep(&state, std::slice::from_ref(&cloned)).expect("Failed to update")
    });
    report("update_deep (no-op)", noop_time, nodes, iters);
    assert!(Value::ptr_eq(&same, &state));

    // Update with a real change
    let (update_time, updated) = time(iters, || {
        update_deep(&state, std::slice::from_ref(&change)).expect("Failed to update")
    });
    report("update_deep (small change)", update_time, nodes, iters);
    assert!(!Value::ptr_eq(&updated, &state));
    if let (Some(before), Some(after)) = (state.get("users"), updated.get("users")) {
        println!("  Users subtree shared: {}", Value::ptr_eq(before, after));
    }

    // Summary
    println!("\n=== Summary ===");
    println!("Nodes: {}", nodes);
    println!(
        "update_deep no-op vs clone_deep: {:.1}x",
        clone_time.as_secs_f64() / noop_time.as_secs_f64()
    );
}
