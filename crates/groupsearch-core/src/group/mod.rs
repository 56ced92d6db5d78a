//! Group search: quota-constrained grouping of ranked candidates.
//!
//! Results are partitioned by the value of a payload field (`group_by`),
//! keeping at most `limit` groups of at most `per_group` hits each. The
//! [`GroupSearch`] engine pulls candidates from a
//! [`CandidateSource`](crate::source::CandidateSource) in growing rounds
//! until the quotas are met or the source runs dry.

mod accumulator;
mod candidate;
mod key;
mod path;
mod request;
mod result;
mod scheduler;

#[cfg(test)]
mod accumulator_tests;
#[cfg(test)]
mod key_tests;

pub use accumulator::{Group, GroupAccumulator, OfferOutcome};
pub use candidate::Candidate;
pub use key::{extract_group_key, GroupKeyValue};
pub use path::GroupByPath;
pub use request::{GroupQuery, GroupRequest};
pub use result::{GroupId, GroupsResult, PointGroup, ScoredHit};
pub use scheduler::{GroupOutcome, GroupSearch, GroupingStats, Termination};

pub(crate) use path::resolve_segments;
