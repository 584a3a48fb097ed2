//! Key selection and value mapping over any container.
//!
//! `pick`, `omit`, `leave`, `unset` and `map` work on records, sequences,
//! sets, maps and instance projections. Each has its own defaults for
//! [`TransformOptions`]:
//!
//! | op    | by_reference | skip_readonly |
//! |-------|--------------|---------------|
//! | pick  | false        | false         |
//! | omit  | false        | false         |
//! | leave | true         | false         |
//! | unset | true         | false         |
//! | map   | false        | true          |
//!
//! Working by reference edits the container in place after checking every
//! affected key; a readonly key fails the call before anything is removed
//! or rewritten. Working on a copy makes every entry of the copy writable
//! first, so nothing is ever skipped there.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::access::{as_container, as_container_mut, describe_key};
use crate::clone::clone;
use crate::error::Error;
use crate::model::{IdentityKey, Value};

/// Per-call overrides; `None` takes the operation's default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub by_reference: Option<bool>,
    pub skip_readonly: Option<bool>,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_reference(mut self, by_reference: bool) -> Self {
        self.by_reference = Some(by_reference);
        self
    }

    pub fn skip_readonly(mut self, skip_readonly: bool) -> Self {
        self.skip_readonly = Some(skip_readonly);
        self
    }

    fn resolve(self, by_reference: bool, skip_readonly: bool) -> Resolved {
        Resolved {
            by_reference: self.by_reference.unwrap_or(by_reference),
            skip_readonly: self.skip_readonly.unwrap_or(skip_readonly),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Resolved {
    by_reference: bool,
    skip_readonly: bool,
}

fn is_selectable(value: &Value) -> bool {
    matches!(
        value,
        Value::Record(_) | Value::Sequence(_) | Value::Set(_) | Value::Map(_) | Value::Tagged(_)
    )
}

/// Copies `value` one level deep and makes the copy writable throughout.
fn thawed_copy(value: &Value) -> Value {
    let mut copy = clone(value);
    if let Some(container) = as_container_mut(&mut copy) {
        container.thaw();
    }
    copy
}

/// Drops readonly keys from `planned`, or fails on the first one.
fn check_writable(
    planned: Vec<Value>,
    skip_readonly: bool,
    writable: impl Fn(&Value) -> bool,
) -> Result<Vec<Value>, Error> {
    let mut allowed = Vec::with_capacity(planned.len());
    for key in planned {
        if writable(&key) {
            allowed.push(key);
        } else if skip_readonly {
            debug!(key = %describe_key(&key), "skipping readonly key");
        } else {
            return Err(Error::ReadonlyViolation {
                key: describe_key(&key),
            });
        }
    }
    Ok(allowed)
}

/// Removes the listed keys (`keep_listed == false`) or every other key.
fn remove_keys(
    container: &mut Value,
    keys: &[Value],
    keep_listed: bool,
    options: Resolved,
) -> Result<Value, Error> {
    if !is_selectable(container) {
        return Ok(container.clone());
    }
    if !options.by_reference {
        let mut copy = thawed_copy(container);
        remove_in_place(&mut copy, keys, keep_listed, options.skip_readonly)?;
        return Ok(copy);
    }
    remove_in_place(container, keys, keep_listed, options.skip_readonly)?;
    Ok(container.clone())
}

fn remove_in_place(
    container: &mut Value,
    keys: &[Value],
    keep_listed: bool,
    skip_readonly: bool,
) -> Result<(), Error> {
    let doomed = {
        let Some(current) = as_container(container) else {
            return Ok(());
        };
        let listed: FxHashSet<IdentityKey> =
            keys.iter().filter_map(|key| current.key_identity(key)).collect();
        let planned: Vec<Value> = current
            .keys()
            .into_iter()
            .filter(|key| {
                let is_listed = current
                    .key_identity(key)
                    .is_some_and(|id| listed.contains(&id));
                is_listed != keep_listed
            })
            .collect();
        check_writable(planned, skip_readonly, |key| current.is_removable(key))?
    };
    if doomed.is_empty() {
        return Ok(());
    }
    debug!(count = doomed.len(), "removing keys");
    if let Some(target) = as_container_mut(container) {
        for key in doomed.iter().rev() {
            target.remove(key)?;
        }
    }
    Ok(())
}

/// Keeps only `keys`. Defaults: copy, fail on readonly.
pub fn pick(container: &mut Value, keys: &[Value], options: TransformOptions) -> Result<Value, Error> {
    remove_keys(container, keys, true, options.resolve(false, false))
}

/// Removes `keys`. Defaults: copy, fail on readonly.
pub fn omit(container: &mut Value, keys: &[Value], options: TransformOptions) -> Result<Value, Error> {
    remove_keys(container, keys, false, options.resolve(false, false))
}

/// Keeps only `keys`. Defaults: in place, fail on readonly.
pub fn leave(container: &mut Value, keys: &[Value], options: TransformOptions) -> Result<Value, Error> {
    remove_keys(container, keys, true, options.resolve(true, false))
}

/// Removes `keys`. Defaults: in place, fail on readonly.
pub fn unset(container: &mut Value, keys: &[Value], options: TransformOptions) -> Result<Value, Error> {
    remove_keys(container, keys, false, options.resolve(true, false))
}

/// Replaces every value with `f(value, key)`, keeping the container kind.
///
/// Defaults: copy, skip readonly entries. For sets the key is the member.
pub fn map<F>(container: &mut Value, f: F, options: TransformOptions) -> Result<Value, Error>
where
    F: FnMut(&Value, &Value) -> Value,
{
    let options = options.resolve(false, true);
    if !is_selectable(container) {
        return Ok(container.clone());
    }
    if !options.by_reference {
        let mut copy = thawed_copy(container);
        map_in_place(&mut copy, f, options.skip_readonly)?;
        return Ok(copy);
    }
    map_in_place(container, f, options.skip_readonly)?;
    Ok(container.clone())
}

fn map_in_place<F>(container: &mut Value, mut f: F, skip_readonly: bool) -> Result<(), Error>
where
    F: FnMut(&Value, &Value) -> Value,
{
    let updates: Vec<(Value, Value)> = {
        let Some(current) = as_container(container) else {
            return Ok(());
        };
        let allowed = check_writable(current.keys(), skip_readonly, |key| current.is_writable(key))?;
        allowed
            .into_iter()
            .filter_map(|key| current.get(&key).map(|value| (key, value)))
            .map(|(key, value)| {
                let mapped = f(&value, &key);
                (key, mapped)
            })
            .collect()
    };
    if updates.is_empty() {
        return Ok(());
    }
    if let Value::Set(set) = container {
        // Members are rebuilt together so one mapping cannot collide with
        // a member that is about to be mapped away.
        let mut replacements: FxHashMap<IdentityKey, Value> = updates
            .into_iter()
            .map(|(member, mapped)| (member.identity_key(), mapped))
            .collect();
        let rebuilt = set.map_members(|member| {
            replacements
                .remove(&member.identity_key())
                .unwrap_or_else(|| member.clone())
        });
        *Arc::make_mut(set) = rebuilt;
        return Ok(());
    }
    if let Some(target) = as_container_mut(container) {
        for (key, value) in updates {
            target.set(&key, value)?;
        }
    }
    Ok(())
}
