//! # `GroupSearch` Core
//!
//! Quota-constrained grouping of vector search results.
//!
//! A grouping request runs a nearest-neighbor search or a recommendation and
//! partitions the ranked hits by the value of a payload field, returning at
//! most `limit` groups of at most `per_group` hits each. Because the search
//! cannot know up front how many candidates it takes to fill the quotas, the
//! engine pulls candidates in growing rounds until the quotas are met or the
//! source has nothing left.
//!
//! ## Quick Start
//!
//! ```rust
//! use groupsearch_core::{DistanceMetric, GroupQuery, GroupRequest, InMemoryCollection, Point};
//! use serde_json::json;
//!
//! let collection = InMemoryCollection::new(2, DistanceMetric::Cosine);
//! collection.upsert(vec![
//!     Point::new(1_u64, vec![1.0, 0.0], Some(json!({"docId": "a"}))),
//!     Point::new(2_u64, vec![0.9, 0.1], Some(json!({"docId": "a"}))),
//!     Point::new(3_u64, vec![0.8, 0.2], Some(json!({"docId": "b"}))),
//! ])?;
//!
//! let request = GroupRequest::new(GroupQuery::nearest(vec![1.0, 0.0]), "docId", 2, 1);
//! let result = collection.search_groups(&request)?;
//! assert_eq!(result.len(), 2);
//! # Ok::<(), groupsearch_core::Error>(())
//! ```
//!
//! Custom backends implement [`CandidateSource`] and run through
//! [`GroupSearch`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
// =============================================================================
// STYLISTIC LINTS - Safe to allow globally (no bug risk)
// =============================================================================
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::redundant_pub_crate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::manual_assert)]
#![allow(clippy::assertions_on_constants)]

pub mod config;
pub mod error;
pub mod filter;
pub mod group;
pub mod guard;
pub mod point;
pub mod source;

pub use config::{ConfigError, GroupSearchConfig, GroupingConfig, LimitsConfig, LoggingConfig};
pub use error::{Error, Result};
pub use filter::{Condition, Filter};
pub use group::{
    extract_group_key, GroupByPath, GroupId, GroupKeyValue, GroupOutcome, GroupQuery,
    GroupRequest, GroupSearch, GroupingStats, GroupsResult, PointGroup, ScoredHit, Termination,
};
pub use guard::{CancelHandle, GuardTrip, RequestGuard};
pub use point::{Point, PointId, ScoredPoint};
pub use source::{
    CandidateBatch, CandidateSource, DistanceMetric, FetchRequest, GroupHints,
    InMemoryCollection, ShardedSource,
};
