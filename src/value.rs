// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Pure helpers over record values.
//!
//! Records are plain [`serde_json::Value`]s. Cloning a `Value` is already a deep clone, so the
//! helpers here only cover what the standard traits do not: a deep merge with replace-on-array
//! semantics, structural equality that treats `1` and `1.0` as the same number, and stripping of
//! child collections from a record.
use serde_json::{Map, Value};

/// Returns true if `value` is a JSON object.
#[inline]
pub fn is_object(value: &Value) -> bool {
    matches!(value, Value::Object(_))
}

/// Compares two values by structure rather than representation.
///
/// Objects compare key-by-key regardless of key order, arrays compare element-wise, and numbers
/// compare by their numeric value so that `1`, `1u64` and `1.0` are all equal. Two integers
/// are only equal if they are the same integer.
pub fn structurally_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            if l == r {
                return true;
            }
            // Integers only match exactly, f64 would conflate them above 2^53.
            if !l.is_f64() && !r.is_f64() {
                return false;
            }
            match (l.as_f64(), r.as_f64()) {
                (Some(l), Some(r)) => l == r,
                _ => false,
            }
        }
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(l, r)| structurally_equal(l, r))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(key, l)| r.get(key).is_some_and(|r| structurally_equal(l, r)))
        }
        (l, r) => l == r,
    }
}

/// Deep-merges `source` into `target`.
///
/// Objects are merged key by key, recursing into keys that hold objects on both sides. Any
/// other value in `source` (including arrays) replaces what `target` holds. If either side is
/// not an object, `target` becomes a copy of `source`.
pub fn merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => merge_maps(target, source),
        (target, source) => *target = source.clone(),
    }
}

fn merge_maps(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(key) {
            Some(existing) if is_object(existing) && is_object(value) => merge(existing, value),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Returns a copy of `base` with `source` deep-merged into it.
pub fn merged(base: &Value, source: &Value) -> Value {
    let mut out = base.clone();
    merge(&mut out, source);
    out
}

/// Overlays `second` on `first`.
///
/// * Two objects are deep-merged into a new value.
/// * A `null` second value keeps the first value.
/// * Otherwise (including a missing first value) the result is a copy of `second`.
pub fn merge_values(first: Option<&Value>, second: &Value) -> Value {
    match (first, second) {
        (Some(first @ Value::Object(_)), Value::Object(_)) => merged(first, second),
        (Some(first), Value::Null) => first.clone(),
        (_, second) => second.clone(),
    }
}

/// Removes every top-level array-valued property from an object.
///
/// Hierarchical records keep their children in arrays; those children are tracked as records
/// of their own, so they are stripped before a record is handed back to the caller.
pub fn strip_arrays(value: &mut Value) {
    if let Value::Object(map) = value {
        map.retain(|_, v| !v.is_array());
    }
}
