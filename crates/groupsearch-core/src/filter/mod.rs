//! Payload filters applied by candidate sources.
//!
//! A filter narrows the candidate stream before grouping: points whose
//! payload does not match are never returned by the source, so they never
//! consume fetch slots or enter the exclusion set.
//!
//! ## Usage
//!
//! ```rust
//! use groupsearch_core::filter::{Condition, Filter};
//! use serde_json::json;
//!
//! let filter = Filter::new(Condition::and(vec![
//!     Condition::eq("lang", "en"),
//!     Condition::gte("year", 2020),
//! ]));
//! assert!(filter.matches(&json!({"lang": "en", "year": 2023})));
//! ```
//!
//! Field names use the same dotted paths as `group_by`. When a field
//! resolves to an array, a comparison matches if any element matches.

mod builders;
mod matching;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A payload filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Root condition.
    pub condition: Condition,
}

impl Filter {
    /// Creates a filter from its root condition.
    #[must_use]
    pub fn new(condition: Condition) -> Self {
        Self { condition }
    }

    /// Returns true if the payload satisfies the filter.
    #[must_use]
    pub fn matches(&self, payload: &Value) -> bool {
        self.condition.matches(payload)
    }
}

impl From<Condition> for Filter {
    fn from(condition: Condition) -> Self {
        Self::new(condition)
    }
}

/// A filter condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// `field == value`
    Eq {
        /// Dotted field path.
        field: String,
        /// Expected value.
        value: Value,
    },
    /// `field != value`; also true when the field is missing.
    Neq {
        /// Dotted field path.
        field: String,
        /// Rejected value.
        value: Value,
    },
    /// `field > value`
    Gt {
        /// Dotted field path.
        field: String,
        /// Bound.
        value: Value,
    },
    /// `field >= value`
    Gte {
        /// Dotted field path.
        field: String,
        /// Bound.
        value: Value,
    },
    /// `field < value`
    Lt {
        /// Dotted field path.
        field: String,
        /// Bound.
        value: Value,
    },
    /// `field <= value`
    Lte {
        /// Dotted field path.
        field: String,
        /// Bound.
        value: Value,
    },
    /// Field equals one of `values`.
    In {
        /// Dotted field path.
        field: String,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// Field is missing or null.
    IsNull {
        /// Dotted field path.
        field: String,
    },
    /// Field is present and not null.
    IsNotNull {
        /// Dotted field path.
        field: String,
    },
    /// All conditions hold. Empty is true.
    And {
        /// Conditions.
        conditions: Vec<Condition>,
    },
    /// At least one condition holds. Empty is false.
    Or {
        /// Conditions.
        conditions: Vec<Condition>,
    },
    /// Negation.
    Not {
        /// Negated condition.
        condition: Box<Condition>,
    },
}
