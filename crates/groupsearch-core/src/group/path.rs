//! `group_by` field path parsing and resolution.
//!
//! The grouping path grammar is restricted to dotted property access
//! (`docId`, `metadata.source`). Array index or bracket notation
//! (`field[]`, `items[0]`) is rejected up front with `no_bracket_syntax`;
//! arrays are handled by the value extraction rules instead.

use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};

/// A validated `group_by` path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupByPath {
    raw: String,
    segments: Vec<String>,
}

impl GroupByPath {
    /// Parses and validates a `group_by` path.
    ///
    /// # Errors
    ///
    /// - [`Error::NoBracketSyntax`] if the path contains `[` or `]`.
    /// - [`Error::InvalidGroupBy`] if the path is empty, has an empty segment
    ///   (`a..b`, `.a`, `a.`) or contains whitespace.
    pub fn parse(input: &str) -> Result<Self> {
        if input.contains(['[', ']']) {
            return Err(Error::NoBracketSyntax(input.to_string()));
        }

        if input.trim().is_empty() {
            return Err(invalid(input, "path is empty"));
        }

        if input.chars().any(char::is_whitespace) {
            return Err(invalid(input, "path must not contain whitespace"));
        }

        let mut segments = Vec::new();
        for segment in input.split('.') {
            if segment.is_empty() {
                return Err(invalid(input, "empty segment"));
            }
            segments.push(segment.to_string());
        }

        Ok(Self {
            raw: input.to_string(),
            segments,
        })
    }

    /// Returns the path as written by the caller.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the property segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolves the path against a payload and returns the first value found.
    ///
    /// When an intermediate segment resolves to an array, lookup continues
    /// into each object element in order. The final value is returned as is
    /// (arrays included); key normalization happens in
    /// [`extract_group_key`](super::key::extract_group_key).
    #[must_use]
    pub fn resolve<'a>(&self, payload: &'a Value) -> Option<&'a Value> {
        resolve_segments(payload, &self.segments)
    }
}

impl fmt::Display for GroupByPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Walks `segments` through objects, descending into object elements of
/// intermediate arrays in order. Shared with payload filters.
pub(crate) fn resolve_segments<'a, S: AsRef<str>>(
    value: &'a Value,
    segments: &[S],
) -> Option<&'a Value> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(value);
    };

    match value {
        Value::Object(map) => resolve_segments(map.get(head.as_ref())?, rest),
        Value::Array(items) => items
            .iter()
            .filter(|item| item.is_object())
            .find_map(|item| resolve_segments(item, segments)),
        _ => None,
    }
}

fn invalid(path: &str, reason: &str) -> Error {
    Error::InvalidGroupBy {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
