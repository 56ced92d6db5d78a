//! Fan-out over several shard sources with score-ordered merge.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{sort_by_score, CandidateBatch, CandidateSource, FetchRequest};
use crate::error::Result;

/// A candidate source made of shards.
///
/// Every fetch is forwarded to all shards (in parallel with the `parallel`
/// feature), the batches are merged by score and truncated to the requested
/// limit. The merged batch is exhausted only if every shard was exhausted and
/// the merge dropped nothing.
#[derive(Debug)]
pub struct ShardedSource<S> {
    shards: Vec<S>,
}

impl<S> ShardedSource<S> {
    /// Creates a sharded source.
    #[must_use]
    pub fn new(shards: Vec<S>) -> Self {
        Self { shards }
    }

    /// Shards, in order.
    #[must_use]
    pub fn shards(&self) -> &[S] {
        &self.shards
    }
}

impl<S: CandidateSource + Sync> CandidateSource for ShardedSource<S> {
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<CandidateBatch> {
        if self.shards.is_empty() {
            return Ok(CandidateBatch::exhausted());
        }

        #[cfg(feature = "parallel")]
        let batches: Vec<Result<CandidateBatch>> = self
            .shards
            .par_iter()
            .map(|shard| shard.fetch(request))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let batches: Vec<Result<CandidateBatch>> = self
            .shards
            .iter()
            .map(|shard| shard.fetch(request))
            .collect();

        let mut exhausted = true;
        let mut merged = Vec::new();
        for batch in batches {
            let batch = batch?;
            exhausted &= batch.exhausted;
            merged.extend(batch.points);
        }

        sort_by_score(&mut merged);
        if merged.len() > request.limit {
            merged.truncate(request.limit);
            exhausted = false;
        }

        tracing::trace!(
            shards = self.shards.len(),
            merged = merged.len(),
            exhausted,
            "sharded fetch merged"
        );

        Ok(CandidateBatch::new(merged, exhausted))
    }
}
