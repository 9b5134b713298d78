// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! `Value` — the Evaluator's runtime value, as distinct from the static
//! `ConfigNode` tree it is folded from.

use std::any::Any;
use std::sync::Arc;

use crate::ordered_map::OrderedMap;
use crate::sentinel::SentinelKind;

/// A loaded-but-not-yet-invoked symbol reference, produced by the `callable`
/// handler and consumed by `initializer`/`from_authorizer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callable {
    pub module: String,
    pub class: String,
    pub method: String,
}

/// A value map, preserving the order keys were produced in (e.g. by `dict`).
pub type ValueMap = OrderedMap<Value>;

/// The Evaluator's value domain. A superset of JSON: adds `Callable` (a
/// loaded-but-uninvoked symbol), `Sentinel` (in-band control markers), and
/// `Opaque` (an externally-constructed instance, e.g. the result of
/// `instance`/`initializer`, carried without the Evaluator needing to know
/// its concrete type).
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(ValueMap),
    Callable(Callable),
    Sentinel(SentinelKind),
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn is_sentinel(&self, kind: SentinelKind) -> bool {
        matches!(self, Value::Sentinel(k) if *k == kind)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness, used wherever the spec talks about a value "being null"
    /// versus having content (predicate `null`/`not_null` excepted — those
    /// check strictly for `Value::Null`, see `adapt_core::predicate`).
    pub fn is_empty_ish(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::List(l) => l.is_empty(),
            Value::Map(m) => m.is_empty(),
            _ => false,
        }
    }

    /// Lossy conversion to JSON. `Callable` and `Opaque` have no JSON
    /// representation and degrade to `null` — the only handlers that ever
    /// serialize a `Value` tree (`filter`'s `json_dumps`) never produce
    /// those variants in their output.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => {
                let entries = map.iter().map(|(k, v)| (k.to_string(), v.to_json())).collect();
                serde_json::Value::Object(entries)
            }
            Value::Callable(_) | Value::Opaque(_) | Value::Sentinel(_) => serde_json::Value::Null,
        }
    }

    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(entries) => {
                let map = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect();
                Value::Map(map)
            }
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(n) => write!(f, "Float({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::List(l) => write!(f, "List({l:?})"),
            Value::Map(m) => write!(f, "Map({m:?})"),
            Value::Callable(c) => write!(f, "Callable({c:?})"),
            Value::Sentinel(s) => write!(f, "Sentinel({s})"),
            Value::Opaque(_) => write!(f, "Opaque(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a == b,
            (Value::Sentinel(a), Value::Sentinel(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_for_scalars() {
        let json = serde_json::json!({"a": 1, "b": [true, null, "x"]});
        let value = Value::from_json(&json);
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn opaque_equality_is_pointer_identity() {
        let a: Arc<dyn Any + Send + Sync> = Arc::new(42i32);
        let b = a.clone();
        let c: Arc<dyn Any + Send + Sync> = Arc::new(42i32);
        assert_eq!(Value::Opaque(a.clone()), Value::Opaque(b));
        assert_ne!(Value::Opaque(a), Value::Opaque(c));
    }

    #[test]
    fn sentinel_equality_by_kind() {
        assert_eq!(Value::Sentinel(SentinelKind::Ignore), Value::Sentinel(SentinelKind::Ignore));
        assert_ne!(Value::Sentinel(SentinelKind::Ignore), Value::Sentinel(SentinelKind::NotFound));
    }
}
