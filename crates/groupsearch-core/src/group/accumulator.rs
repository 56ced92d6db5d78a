//! In-progress groups of a single grouping request.

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};

use super::candidate::Candidate;
use super::key::{extract_group_key, GroupKeyValue};
use super::path::GroupByPath;
use crate::point::PointId;

/// Result of offering a candidate to the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OfferOutcome {
    /// The candidate joined (or opened) a group.
    Accepted,
    /// The point id is already in a group.
    RejectedDuplicate,
    /// The payload has no usable group key.
    RejectedNoKey,
    /// The candidate's group already holds `per_group` hits.
    RejectedGroupFull,
    /// The candidate would open a new group but `limit` groups exist.
    RejectedGroupCapacityReached,
}

impl OfferOutcome {
    /// Returns true for [`OfferOutcome::Accepted`].
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// A group under construction: hits kept sorted by score descending, then
/// by delivery rank.
#[derive(Debug, Clone)]
pub struct Group {
    key: GroupKeyValue,
    hits: Vec<Candidate>,
    capacity: usize,
}

impl Group {
    fn new(key: GroupKeyValue, capacity: usize) -> Self {
        Self {
            key,
            hits: Vec::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Group key.
    #[must_use]
    pub fn key(&self) -> &GroupKeyValue {
        &self.key
    }

    /// Hits in ranking order.
    #[must_use]
    pub fn hits(&self) -> &[Candidate] {
        &self.hits
    }

    /// Number of hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Returns true if the group has no hits (never the case once created).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Returns true if the group holds `per_group` hits.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.hits.len() >= self.capacity
    }

    /// Best (first) hit.
    #[must_use]
    pub fn best(&self) -> Option<&Candidate> {
        self.hits.first()
    }

    pub(crate) fn into_parts(self) -> (GroupKeyValue, Vec<Candidate>) {
        (self.key, self.hits)
    }

    // Batches from later rounds may outrank earlier hits, so merge-insert
    // rather than push.
    fn insert(&mut self, candidate: Candidate) {
        let pos = self
            .hits
            .partition_point(|hit| hit.rank_order(&candidate).is_lt());
        self.hits.insert(pos, candidate);
    }
}

/// Accumulates candidates into at most `limit` groups of at most
/// `per_group` hits each.
#[derive(Debug)]
pub struct GroupAccumulator {
    path: GroupByPath,
    limit: usize,
    per_group: usize,
    groups: IndexMap<GroupKeyValue, Group, FxBuildHasher>,
    assigned: FxHashSet<PointId>,
    // Kept in step with `groups` by `offer`; handed to sources as hints.
    full_keys: FxHashSet<GroupKeyValue>,
    open_keys: FxHashSet<GroupKeyValue>,
}

impl GroupAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new(path: GroupByPath, limit: usize, per_group: usize) -> Self {
        Self {
            path,
            limit,
            per_group,
            groups: IndexMap::with_hasher(FxBuildHasher),
            assigned: FxHashSet::default(),
            full_keys: FxHashSet::default(),
            open_keys: FxHashSet::default(),
        }
    }

    /// Offers a candidate.
    pub fn offer(&mut self, candidate: Candidate) -> OfferOutcome {
        if self.assigned.contains(&candidate.id()) {
            return OfferOutcome::RejectedDuplicate;
        }

        let Some(key) = candidate
            .point
            .payload
            .as_ref()
            .and_then(|payload| extract_group_key(payload, &self.path))
        else {
            return OfferOutcome::RejectedNoKey;
        };

        let id = candidate.id();
        if let Some(group) = self.groups.get_mut(&key) {
            if group.is_full() {
                return OfferOutcome::RejectedGroupFull;
            }
            group.insert(candidate);
            if group.is_full() {
                self.open_keys.remove(&key);
                self.full_keys.insert(key);
            }
        } else {
            if self.groups.len() >= self.limit {
                return OfferOutcome::RejectedGroupCapacityReached;
            }
            let mut group = Group::new(key.clone(), self.per_group);
            group.insert(candidate);
            if group.is_full() {
                self.full_keys.insert(key.clone());
            } else {
                self.open_keys.insert(key.clone());
            }
            self.groups.insert(key, group);
        }

        self.assigned.insert(id);
        OfferOutcome::Accepted
    }

    /// Number of groups formed.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of groups holding `per_group` hits.
    #[must_use]
    pub fn full_group_count(&self) -> usize {
        self.full_keys.len()
    }

    /// Number of points placed into groups.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.assigned.len()
    }

    /// Returns true once `limit` groups each hold `per_group` hits.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.groups.len() >= self.limit && self.full_keys.len() >= self.limit
    }

    /// Hits still missing before the accumulator is complete: the free slots
    /// of open groups plus `per_group` for every group not formed yet.
    #[must_use]
    pub fn deficit(&self) -> usize {
        let open_slots: usize = self
            .groups
            .values()
            .map(|g| self.per_group.saturating_sub(g.len()))
            .sum();
        let missing_groups = self.limit.saturating_sub(self.groups.len());
        open_slots.saturating_add(missing_groups.saturating_mul(self.per_group))
    }

    /// Keys of groups that cannot accept any more hits.
    #[must_use]
    pub fn full_keys(&self) -> &FxHashSet<GroupKeyValue> {
        &self.full_keys
    }

    /// Once `limit` groups exist, the only keys that can still accept hits.
    /// `None` while new groups may still be opened.
    #[must_use]
    pub fn open_keys(&self) -> Option<&FxHashSet<GroupKeyValue>> {
        (self.groups.len() >= self.limit).then_some(&self.open_keys)
    }

    /// Iterates over groups in creation order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Consumes the accumulator, returning groups ordered by their best hit
    /// (score descending, then delivery rank).
    #[must_use]
    pub fn into_sorted_groups(self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.groups.into_values().collect();
        groups.sort_by(|a, b| match (a.best(), b.best()) {
            (Some(a), Some(b)) => a.rank_order(b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        groups
    }
}
