//! Group key values and their extraction from payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

use super::path::GroupByPath;

/// A normalized scalar identifying a group.
///
/// Equality and hashing are type-aware: the number `1` and the string `"1"`
/// are different keys. Numbers compare by their JSON representation, so an
/// integer read from an array element equals the same integer read directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupKeyValue {
    /// Boolean key.
    Bool(bool),
    /// Numeric key (integer or float, never coerced to a string).
    Number(Number),
    /// String key.
    String(String),
}

impl GroupKeyValue {
    /// Converts a JSON scalar into a key. Returns `None` for null, arrays and
    /// objects.
    #[must_use]
    pub fn from_scalar(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Returns the key as a JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for GroupKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for GroupKeyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for GroupKeyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for GroupKeyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for GroupKeyValue {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<u64> for GroupKeyValue {
    fn from(value: u64) -> Self {
        Self::Number(Number::from(value))
    }
}

/// Extracts the group key of a payload.
///
/// Rules:
/// - missing field: `None`
/// - array: only the first element is considered (`[]` gives `None`)
/// - null, object, or a nested array as first element: `None`
/// - string, number, boolean: the key, keeping its JSON type
#[must_use]
pub fn extract_group_key(payload: &Value, path: &GroupByPath) -> Option<GroupKeyValue> {
    let value = path.resolve(payload)?;
    let scalar = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    GroupKeyValue::from_scalar(scalar)
}
