//! Grouping request model.

use serde::{Deserialize, Serialize};

use super::path::GroupByPath;
use crate::config::LimitsConfig;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::point::PointId;

/// What to search for. Passed through opaquely to the candidate source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupQuery {
    /// Nearest neighbors of a vector.
    Nearest {
        /// Query vector.
        vector: Vec<f32>,
    },
    /// Recommendation from example points.
    Recommend {
        /// Points the results should resemble.
        positive: Vec<PointId>,
        /// Points the results should not resemble.
        #[serde(default)]
        negative: Vec<PointId>,
    },
}

impl GroupQuery {
    /// Nearest-neighbor query.
    #[must_use]
    pub fn nearest(vector: Vec<f32>) -> Self {
        Self::Nearest { vector }
    }

    /// Recommendation query.
    #[must_use]
    pub fn recommend(positive: Vec<PointId>, negative: Vec<PointId>) -> Self {
        Self::Recommend { positive, negative }
    }
}

/// A grouping request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRequest {
    /// Search query (`vector`, or `positive`/`negative` at top level).
    #[serde(flatten)]
    pub query: GroupQuery,
    /// Payload field whose value identifies a group.
    pub group_by: String,
    /// Maximum number of groups.
    pub limit: usize,
    /// Maximum number of hits per group.
    pub per_group: usize,
    /// Include payloads in hits. Off when absent from JSON.
    #[serde(default)]
    pub with_payload: bool,
    /// Include vectors in hits.
    #[serde(default)]
    pub with_vector: bool,
    /// Payload filter applied by the candidate source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    /// Candidates scoring below this are not returned by the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f32>,
}

impl GroupRequest {
    /// Creates a request with payloads on, vectors off, no filter.
    ///
    /// Deserialized requests default `with_payload` to false instead.
    #[must_use]
    pub fn new(query: GroupQuery, group_by: impl Into<String>, limit: usize, per_group: usize) -> Self {
        Self {
            query,
            group_by: group_by.into(),
            limit,
            per_group,
            with_payload: true,
            with_vector: false,
            filter: None,
            score_threshold: None,
        }
    }

    /// Sets `with_payload`.
    #[must_use]
    pub fn with_payload(mut self, with_payload: bool) -> Self {
        self.with_payload = with_payload;
        self
    }

    /// Sets `with_vector`.
    #[must_use]
    pub fn with_vector(mut self, with_vector: bool) -> Self {
        self.with_vector = with_vector;
        self
    }

    /// Sets the payload filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets the score threshold.
    #[must_use]
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    /// Validates the request and returns its parsed `group_by` path.
    ///
    /// The path is checked first so that bracket notation is reported even
    /// when other parameters are also wrong.
    ///
    /// # Errors
    ///
    /// Returns a validation error ([`Error::is_validation`]) on the first
    /// problem found.
    pub fn validate(&self, limits: &LimitsConfig) -> Result<GroupByPath> {
        let path = GroupByPath::parse(&self.group_by)?;

        if self.limit == 0 {
            return Err(Error::InvalidRequest("limit must be positive".into()));
        }
        if self.limit > limits.max_limit {
            return Err(Error::InvalidRequest(format!(
                "limit {} exceeds the maximum of {}",
                self.limit, limits.max_limit
            )));
        }
        if self.per_group == 0 {
            return Err(Error::InvalidRequest("per_group must be positive".into()));
        }
        if self.per_group > limits.max_per_group {
            return Err(Error::InvalidRequest(format!(
                "per_group {} exceeds the maximum of {}",
                self.per_group, limits.max_per_group
            )));
        }

        match &self.query {
            GroupQuery::Nearest { vector } => {
                if vector.is_empty() {
                    return Err(Error::InvalidRequest("query vector is empty".into()));
                }
                if vector.iter().any(|x| !x.is_finite()) {
                    return Err(Error::InvalidRequest(
                        "query vector contains non-finite values".into(),
                    ));
                }
            }
            GroupQuery::Recommend { positive, .. } => {
                if positive.is_empty() {
                    return Err(Error::InvalidRequest(
                        "recommendation needs at least one positive example".into(),
                    ));
                }
            }
        }

        if self.score_threshold.is_some_and(|t| !t.is_finite()) {
            return Err(Error::InvalidRequest("score_threshold must be finite".into()));
        }

        Ok(path)
    }
}
