//! Candidate sources: the ranked search the grouping engine draws from.
//!
//! The engine only needs "up to N more ranked candidates, excluding these
//! ids". Whether the source runs a nearest-neighbor search or a
//! recommendation, over one index or many shards, is its own business.

mod memory;
mod sharded;

#[cfg(test)]
mod memory_tests;

pub use memory::{DistanceMetric, InMemoryCollection};
pub use sharded::ShardedSource;

use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::error::Result;
use crate::filter::Filter;
use crate::group::{extract_group_key, GroupByPath, GroupKeyValue, GroupQuery};
use crate::point::{PointId, ScoredPoint};

/// Optional key pushdown for sources that can evaluate the group key.
///
/// Honoring hints only avoids fetching candidates the accumulator would
/// reject; results stay correct when a source ignores them.
#[derive(Debug, Clone, Default)]
pub struct GroupHints<'a> {
    /// Grouping path, when known.
    pub group_by: Option<&'a GroupByPath>,
    /// Keys whose groups are full.
    pub full_keys: Option<&'a FxHashSet<GroupKeyValue>>,
    /// When set, the only keys that can still be accepted.
    pub open_keys: Option<&'a FxHashSet<GroupKeyValue>>,
}

impl GroupHints<'_> {
    /// Returns false when the payload can only produce a rejected candidate.
    ///
    /// Payloads without a key are kept: a source cannot tell them apart from
    /// candidates it should report, and the engine needs them in its
    /// exclusion set anyway.
    #[must_use]
    pub fn admits(&self, payload: Option<&Value>) -> bool {
        let Some(path) = self.group_by else {
            return true;
        };
        let Some(key) = payload.and_then(|p| extract_group_key(p, path)) else {
            return true;
        };
        if self.full_keys.is_some_and(|full| full.contains(&key)) {
            return false;
        }
        self.open_keys.is_none_or(|open| open.contains(&key))
    }
}

/// One fetch round.
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    /// The search query.
    pub query: &'a GroupQuery,
    /// Ids that must not be returned.
    pub exclude: &'a FxHashSet<PointId>,
    /// Maximum number of candidates to return.
    pub limit: usize,
    /// Payload filter.
    pub filter: Option<&'a Filter>,
    /// Minimum score.
    pub score_threshold: Option<f32>,
    /// Key pushdown hints.
    pub hints: GroupHints<'a>,
}

impl<'a> FetchRequest<'a> {
    /// Creates a request without filter, threshold or hints.
    #[must_use]
    pub fn new(query: &'a GroupQuery, exclude: &'a FxHashSet<PointId>, limit: usize) -> Self {
        Self {
            query,
            exclude,
            limit,
            filter: None,
            score_threshold: None,
            hints: GroupHints::default(),
        }
    }
}

/// Candidates returned by one fetch.
#[derive(Debug, Clone, Default)]
pub struct CandidateBatch {
    /// Candidates ordered by score descending, ties broken deterministically.
    pub points: Vec<ScoredPoint>,
    /// No further distinct candidates exist beyond `points`.
    pub exhausted: bool,
}

impl CandidateBatch {
    /// Creates a batch.
    #[must_use]
    pub fn new(points: Vec<ScoredPoint>, exhausted: bool) -> Self {
        Self { points, exhausted }
    }

    /// An empty, exhausted batch.
    #[must_use]
    pub fn exhausted() -> Self {
        Self::new(Vec::new(), true)
    }
}

/// Ranked search the grouping engine pulls candidates from.
///
/// Contract:
/// - candidates are ordered by score descending, ties broken
///   deterministically;
/// - no id from `request.exclude` is returned;
/// - `exhausted` is set when nothing beyond the returned candidates exists.
///
/// Errors are propagated unchanged by the engine.
pub trait CandidateSource {
    /// Fetches the next candidates.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying search.
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<CandidateBatch>;
}

impl<S: CandidateSource + ?Sized> CandidateSource for &S {
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<CandidateBatch> {
        (**self).fetch(request)
    }
}

impl<S: CandidateSource + ?Sized> CandidateSource for Box<S> {
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<CandidateBatch> {
        (**self).fetch(request)
    }
}

/// Sorts scored points by score descending, then id ascending.
pub(crate) fn sort_by_score(points: &mut [ScoredPoint]) {
    points.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.point.id.cmp(&b.point.id))
    });
}
