//! Point data structures consumed by the grouping engine.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

/// Identifier of a point: an unsigned integer or a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    /// Numeric identifier.
    Num(u64),
    /// UUID identifier (serialized as its hyphenated string form).
    Uuid(Uuid),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(id) => write!(f, "{id}"),
            Self::Uuid(id) => write!(f, "{id}"),
        }
    }
}

impl From<u64> for PointId {
    fn from(id: u64) -> Self {
        Self::Num(id)
    }
}

impl From<Uuid> for PointId {
    fn from(id: Uuid) -> Self {
        Self::Uuid(id)
    }
}

/// A point as stored by the underlying search engine.
///
/// A point consists of:
/// - A unique identifier
/// - A vector (embedding)
/// - Optional payload (metadata)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    /// Unique identifier for the point.
    pub id: PointId,

    /// The vector embedding.
    pub vector: Vec<f32>,

    /// Optional JSON payload containing metadata.
    #[serde(default)]
    pub payload: Option<JsonValue>,
}

impl Point {
    /// Creates a new point with the given ID, vector, and optional payload.
    #[must_use]
    pub fn new(id: impl Into<PointId>, vector: Vec<f32>, payload: Option<JsonValue>) -> Self {
        Self {
            id: id.into(),
            vector,
            payload,
        }
    }

    /// Creates a new point without payload.
    #[must_use]
    pub fn without_payload(id: impl Into<PointId>, vector: Vec<f32>) -> Self {
        Self::new(id, vector, None)
    }

    /// Returns the dimension of the vector.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// A point returned by a candidate source together with its similarity score.
///
/// Higher scores are better; sources convert distances before handing them
/// to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPoint {
    /// The matching point.
    pub point: Point,

    /// Similarity score.
    pub score: f32,
}

impl ScoredPoint {
    /// Creates a new scored point.
    #[must_use]
    pub const fn new(point: Point, score: f32) -> Self {
        Self { point, score }
    }

    /// Shortcut for the point id.
    #[must_use]
    pub fn id(&self) -> PointId {
        self.point.id
    }
}
