//! Condition evaluation.

use serde_json::{Number, Value};
use std::cmp::Ordering;

use super::Condition;
use crate::group::resolve_segments;

impl Condition {
    /// Evaluates the condition against a payload.
    #[must_use]
    pub fn matches(&self, payload: &Value) -> bool {
        match self {
            Self::Eq { field, value } => any_element(payload, field, |v| values_equal(v, value)),
            Self::Neq { field, value } => !any_element(payload, field, |v| values_equal(v, value)),
            Self::Gt { field, value } => {
                any_element(payload, field, |v| compare(v, value) == Some(Ordering::Greater))
            }
            Self::Gte { field, value } => any_element(payload, field, |v| {
                matches!(compare(v, value), Some(Ordering::Greater | Ordering::Equal))
            }),
            Self::Lt { field, value } => {
                any_element(payload, field, |v| compare(v, value) == Some(Ordering::Less))
            }
            Self::Lte { field, value } => any_element(payload, field, |v| {
                matches!(compare(v, value), Some(Ordering::Less | Ordering::Equal))
            }),
            Self::In { field, values } => any_element(payload, field, |v| {
                values.iter().any(|candidate| values_equal(v, candidate))
            }),
            Self::IsNull { field } => lookup(payload, field).is_none_or(Value::is_null),
            Self::IsNotNull { field } => lookup(payload, field).is_some_and(|v| !v.is_null()),
            Self::And { conditions } => conditions.iter().all(|c| c.matches(payload)),
            Self::Or { conditions } => conditions.iter().any(|c| c.matches(payload)),
            Self::Not { condition } => !condition.matches(payload),
        }
    }
}

fn lookup<'a>(payload: &'a Value, field: &str) -> Option<&'a Value> {
    let segments: Vec<&str> = field.split('.').collect();
    resolve_segments(payload, &segments)
}

/// Applies `pred` to the field value, or to each element when it is an array.
fn any_element(payload: &Value, field: &str, pred: impl Fn(&Value) -> bool) -> bool {
    match lookup(payload, field) {
        None => false,
        Some(Value::Array(items)) => items.iter().any(&pred),
        Some(value) => pred(value),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        _ => a == b,
    }
}

// Integers compare exactly; anything involving a float compares as f64.
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    a.as_f64().zip(b.as_f64()).is_some_and(|(a, b)| a == b)
}

/// Orders numbers with numbers and strings with strings; anything else is
/// not comparable.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                return Some(a.cmp(&b));
            }
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
