// SPDX-License-Identifier: Apache-2.0
//! Snapshot value model.
//!
//! The engine observes opaque, arbitrarily-nested, effectively-immutable
//! values. [`Value`] is that value type: scalars are stored inline, while
//! strings and containers sit behind an [`Arc`] so a snapshot producer can
//! reuse unchanged branches across snapshots at zero cost. That reuse is what
//! the traversal's per-level comparison ([`Value::same`]) keys on — a shared
//! branch is detected as unchanged in O(1) without descending into it.
//!
//! # `same` vs `==`
//!
//! `Value` implements deep structural equality via `PartialEq`, which is what
//! tests and consumers want when inspecting a delivered snapshot. The engine
//! itself never uses `==` during traversal; it uses [`Value::same`], a
//! *shallow* per-level check: scalars compare by value, containers compare by
//! `Arc` pointer identity. Two structurally identical containers built
//! independently are **not** `same` — under an immutable-snapshot discipline
//! an unchanged branch is the same allocation, not a lookalike.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One immutable snapshot value, or a branch of one.
///
/// Containers (`Str`, `Array`, `Object`) are reference-counted; cloning a
/// `Value` never deep-copies. Build snapshots either directly via
/// [`Value::object`] / [`Value::array`] (which lets you share subtrees
/// across snapshots) or by converting from [`serde_json::Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent or explicitly-null value. Indexing a missing key yields `Null`,
    /// and two `Null`s always compare as unchanged.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar. Compared by `f64` equality, so `NaN` is never
    /// equal to itself — a `NaN`-valued path re-fires on every update.
    Float(f64),
    /// String scalar. Shared, but compared by content: strings are leaves, so
    /// value comparison is both cheap and avoids false positives.
    Str(Arc<str>),
    /// Ordered sequence, indexable by numeric string keys (`"0"`, `"1"`, ...).
    Array(Arc<Vec<Value>>),
    /// String-keyed mapping with deterministic iteration order.
    Object(Arc<BTreeMap<String, Value>>),
}

impl Value {
    /// Builds an `Object` value from key/value pairs.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Builds an `Array` value from items.
    pub fn array<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Array(Arc::new(items.into_iter().collect()))
    }

    /// Indexes one level down by string key.
    ///
    /// Objects look the key up directly; arrays accept numeric string keys.
    /// Any miss — absent key, out-of-range index, non-numeric key on an
    /// array, or indexing into `Null` or a scalar — yields [`Value::Null`]
    /// rather than an error, so a branch that transitions to null propagates
    /// `Null` into its children instead of faulting.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Null),
            Value::Array(items) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Shallow per-level comparison used by the update traversal.
    ///
    /// Scalars (and strings) compare by value; arrays and objects compare by
    /// `Arc` pointer identity only. Returns `true` when the two values are
    /// unchanged at this level, which tells the traversal to skip the entire
    /// subtree beneath them.
    pub fn same(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Str(x), Value::Str(y)) => Arc::ptr_eq(x, y) || x == y,
            (Value::Array(x), Value::Array(y)) => Arc::ptr_eq(x, y),
            (Value::Object(x), Value::Object(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }

    /// True when this value is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(Arc::from(v.as_str()))
    }
}

impl From<serde_json::Value> for Value {
    /// Deep conversion from a `serde_json` value.
    ///
    /// The result shares nothing with the source. Structural sharing between
    /// consecutive snapshots comes from the producer reusing `Value` branches
    /// (cheap clones), not from this conversion.
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_i64().map_or_else(
                || Value::Float(n.as_f64().unwrap_or(f64::NAN)),
                Value::Int,
            ),
            serde_json::Value::String(s) => Value::Str(Arc::from(s.as_str())),
            serde_json::Value::Array(items) => {
                Value::Array(Arc::new(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(map) => Value::Object(Arc::new(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
        }
    }
}

impl fmt::Display for Value {
    /// JSON-shaped rendering for logs and diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{k:?}:{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_walks_objects_and_arrays() {
        let v = Value::from(json!({"a": {"b": [10, 20]}}));
        assert_eq!(v.get("a").get("b").get("1"), Value::Int(20));
    }

    #[test]
    fn get_on_missing_or_scalar_is_null() {
        let v = Value::from(json!({"a": 1}));
        assert!(v.get("missing").is_null());
        assert!(v.get("a").get("deeper").is_null());
        assert!(Value::Null.get("anything").is_null());
    }

    #[test]
    fn get_rejects_non_numeric_array_keys() {
        let v = Value::from(json!([1, 2, 3]));
        assert!(v.get("x").is_null());
        assert!(v.get("7").is_null());
        assert_eq!(v.get("0"), Value::Int(1));
    }

    #[test]
    fn same_compares_scalars_by_value() {
        assert!(Value::same(&Value::Int(1), &Value::Int(1)));
        assert!(!Value::same(&Value::Int(1), &Value::Int(2)));
        assert!(Value::same(&Value::Null, &Value::Null));
        assert!(!Value::same(&Value::Null, &Value::Int(0)));
        assert!(Value::same(&Value::from("hi"), &Value::from("hi")));
    }

    #[test]
    fn same_compares_containers_by_identity() {
        let a = Value::from(json!({"x": 1}));
        let b = a.clone();
        assert!(Value::same(&a, &b));

        // Structurally identical but independently built: not the same branch.
        let c = Value::from(json!({"x": 1}));
        assert!(!Value::same(&a, &c));
        assert_eq!(a, c); // deep equality still holds
    }

    #[test]
    fn nan_is_never_same() {
        let nan = Value::Float(f64::NAN);
        assert!(!Value::same(&nan, &nan.clone()));
    }

    #[test]
    fn json_numbers_convert_to_int_or_float() {
        assert_eq!(Value::from(json!(7)), Value::Int(7));
        assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
    }

    #[test]
    fn display_renders_json_shape() {
        let v = Value::object([("a", Value::array([Value::Int(1), Value::Null]))]);
        assert_eq!(v.to_string(), r#"{"a":[1,null]}"#);
    }
}
