//! Grouping response types.
//!
//! Serialized shape:
//!
//! ```json
//! { "groups": [ { "group_id": { "docId": "doc_1" },
//!                 "hits": [ { "id": 5, "score": 0.93, "payload": { "docId": "doc_1" } } ] } ] }
//! ```

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::accumulator::Group;
use super::candidate::Candidate;
use super::key::GroupKeyValue;
use crate::point::PointId;

/// Identity of a group: the `group_by` field and the key value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupId {
    /// The `group_by` path, as written in the request.
    pub field: String,
    /// The key shared by every hit of the group.
    pub value: GroupKeyValue,
}

impl Serialize for GroupId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.value)?;
        map.end()
    }
}

/// A hit inside a group.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredHit {
    /// Point id.
    pub id: PointId,
    /// Similarity score.
    pub score: f32,
    /// Payload, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Vector, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

impl ScoredHit {
    pub(crate) fn materialize(candidate: Candidate, with_payload: bool, with_vector: bool) -> Self {
        let Candidate { point, score, .. } = candidate;
        Self {
            id: point.id,
            score,
            payload: if with_payload { point.payload } else { None },
            vector: if with_vector { Some(point.vector) } else { None },
        }
    }
}

/// One group of the response.
#[derive(Debug, Clone, Serialize)]
pub struct PointGroup {
    /// Group identity.
    #[serde(rename = "group_id")]
    pub id: GroupId,
    /// Hits, best first.
    pub hits: Vec<ScoredHit>,
}

impl PointGroup {
    pub(crate) fn from_group(
        group: Group,
        field: &str,
        with_payload: bool,
        with_vector: bool,
    ) -> Self {
        let (value, hits) = group.into_parts();
        Self {
            id: GroupId {
                field: field.to_string(),
                value,
            },
            hits: hits
                .into_iter()
                .map(|c| ScoredHit::materialize(c, with_payload, with_vector))
                .collect(),
        }
    }

    /// Score of the best hit.
    #[must_use]
    pub fn best_score(&self) -> Option<f32> {
        self.hits.first().map(|h| h.score)
    }
}

/// Response of a grouping request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupsResult {
    /// Groups ordered by best-hit score, descending.
    pub groups: Vec<PointGroup>,
}

impl GroupsResult {
    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true when no group was formed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
