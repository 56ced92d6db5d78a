//! Brute-force in-memory candidate source.
//!
//! Scores every stored point on each fetch. Meant for tests, benchmarks and
//! small datasets, not as a substitute for a real index.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{sort_by_score, CandidateBatch, CandidateSource, FetchRequest};
use crate::error::{Error, Result};
use crate::group::{GroupOutcome, GroupQuery, GroupRequest, GroupSearch, GroupsResult};
use crate::point::{Point, PointId, ScoredPoint};

/// Similarity used to score points. Higher is always better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine similarity.
    #[default]
    Cosine,
    /// Dot product (inner product).
    #[serde(alias = "dot")]
    DotProduct,
}

impl DistanceMetric {
    /// Similarity between two vectors of equal dimension.
    #[must_use]
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::DotProduct => dot_product(a, b),
        }
    }
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = dot_product(a, a).sqrt();
    let norm_b = dot_product(b, b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot_product(a, b) / (norm_a * norm_b)
}

/// Points kept in memory behind a read-write lock.
#[derive(Debug)]
pub struct InMemoryCollection {
    dimension: usize,
    metric: DistanceMetric,
    points: RwLock<BTreeMap<PointId, Point>>,
}

impl InMemoryCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            dimension,
            metric,
            points: RwLock::new(BTreeMap::new()),
        }
    }

    /// Vector dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Similarity metric.
    #[must_use]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Inserts or replaces points.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if any vector has the wrong
    /// dimension; nothing is written in that case.
    pub fn upsert(&self, points: impl IntoIterator<Item = Point>) -> Result<usize> {
        let points: Vec<Point> = points.into_iter().collect();
        if let Some(bad) = points.iter().find(|p| p.dimension() != self.dimension) {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: bad.dimension(),
            });
        }

        let count = points.len();
        let mut storage = self.points.write();
        for point in points {
            storage.insert(point.id, point);
        }
        Ok(count)
    }

    /// Returns a copy of a point.
    #[must_use]
    pub fn get(&self, id: PointId) -> Option<Point> {
        self.points.read().get(&id).cloned()
    }

    /// Number of stored points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    /// Returns true if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }

    /// Runs a grouping request with the default engine configuration.
    ///
    /// # Errors
    ///
    /// See [`GroupSearch::search_groups`].
    pub fn search_groups(&self, request: &GroupRequest) -> Result<GroupsResult> {
        GroupSearch::default().search_groups(self, request)
    }

    /// Like [`Self::search_groups`] but returns termination and statistics.
    ///
    /// # Errors
    ///
    /// See [`GroupSearch::run`].
    pub fn run_groups(&self, request: &GroupRequest) -> Result<GroupOutcome> {
        GroupSearch::default().run(self, request)
    }

    /// Resolves the query into a target vector plus ids that must never be
    /// returned (recommendation examples).
    fn target(
        &self,
        query: &GroupQuery,
        storage: &BTreeMap<PointId, Point>,
    ) -> Result<(Vec<f32>, Vec<PointId>)> {
        match query {
            GroupQuery::Nearest { vector } => {
                if vector.len() != self.dimension {
                    return Err(Error::DimensionMismatch {
                        expected: self.dimension,
                        actual: vector.len(),
                    });
                }
                Ok((vector.clone(), Vec::new()))
            }
            GroupQuery::Recommend { positive, negative } => {
                if positive.is_empty() {
                    return Err(Error::InvalidRequest(
                        "recommendation needs at least one positive example".into(),
                    ));
                }
                let avg_positive = self.average(positive, storage)?;
                let target = if negative.is_empty() {
                    avg_positive
                } else {
                    let avg_negative = self.average(negative, storage)?;
                    avg_positive
                        .iter()
                        .zip(&avg_negative)
                        .map(|(p, n)| p + (p - n))
                        .collect()
                };
                let examples = positive.iter().chain(negative).copied().collect();
                Ok((target, examples))
            }
        }
    }

    fn average(&self, ids: &[PointId], storage: &BTreeMap<PointId, Point>) -> Result<Vec<f32>> {
        let mut sum = vec![0.0_f32; self.dimension];
        for id in ids {
            let point = storage.get(id).ok_or(Error::PointNotFound(*id))?;
            for (acc, x) in sum.iter_mut().zip(&point.vector) {
                *acc += x;
            }
        }
        let n = ids.len() as f32;
        for x in &mut sum {
            *x /= n;
        }
        Ok(sum)
    }
}

impl CandidateSource for InMemoryCollection {
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<CandidateBatch> {
        let storage = self.points.read();
        let (target, examples) = self.target(request.query, &storage)?;

        // Score on borrowed points, clone only what survives truncation.
        let mut scored: Vec<(&Point, f32)> = storage
            .values()
            .filter(|p| !request.exclude.contains(&p.id) && !examples.contains(&p.id))
            .filter(|p| {
                request
                    .filter
                    .is_none_or(|f| f.matches(p.payload.as_ref().unwrap_or(&Value::Null)))
            })
            .filter(|p| request.hints.admits(p.payload.as_ref()))
            .map(|p| (p, self.metric.similarity(&target, &p.vector)))
            .filter(|(_, score)| request.score_threshold.is_none_or(|t| *score >= t))
            .collect();

        let exhausted = scored.len() <= request.limit;
        if !exhausted {
            scored.select_nth_unstable_by(request.limit, |a, b| {
                b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id))
            });
            scored.truncate(request.limit);
        }

        let mut points: Vec<ScoredPoint> = scored
            .into_iter()
            .map(|(p, score)| ScoredPoint::new(p.clone(), score))
            .collect();
        drop(storage);

        sort_by_score(&mut points);
        Ok(CandidateBatch::new(points, exhausted))
    }
}
