//! Ranked candidates flowing from a source into the accumulator.

use std::cmp::Ordering;

use crate::point::{Point, PointId, ScoredPoint};

/// A point offered for grouping, with its score and delivery rank.
///
/// The rank is assigned by the scheduler in delivery order across all rounds
/// of a request and breaks score ties deterministically.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The point (payload included, vector possibly stripped later).
    pub point: Point,
    /// Similarity score, higher is better.
    pub score: f32,
    /// Delivery rank, lower was delivered first.
    pub rank: u64,
}

impl Candidate {
    /// Wraps a scored point with its delivery rank.
    #[must_use]
    pub fn new(scored: ScoredPoint, rank: u64) -> Self {
        Self {
            point: scored.point,
            score: scored.score,
            rank,
        }
    }

    /// Point id.
    #[must_use]
    pub fn id(&self) -> PointId {
        self.point.id
    }

    /// Ranking order: score descending, then rank ascending.
    ///
    /// `Ordering::Less` means `self` ranks before `other`.
    #[must_use]
    pub fn rank_order(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.rank.cmp(&other.rank))
    }
}
