//! Group scheduler: drives fetch rounds until the quotas are met.
//!
//! ```text
//! Init -> Fetching -> Evaluating -> Fetching | Done | Exhausted
//! ```
//!
//! Every round fetches candidates not seen before (the exclusion set holds
//! every consumed id, accepted or not), offers them to the accumulator in
//! rank order and grows the next fetch geometrically. Rounds and examined
//! candidates are bounded; hitting a bound ends the request like exhaustion.

use rustc_hash::FxHashSet;

use super::accumulator::{GroupAccumulator, OfferOutcome};
use super::candidate::Candidate;
use super::request::GroupRequest;
use super::result::{GroupsResult, PointGroup};
use crate::config::{GroupSearchConfig, GroupingConfig, LimitsConfig};
use crate::error::{Error, Result};
use crate::guard::{GuardTrip, RequestGuard};
use crate::point::PointId;
use crate::source::{CandidateBatch, CandidateSource, FetchRequest, GroupHints};

/// Why a grouping request stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// `limit` groups of `per_group` hits each.
    Complete,
    /// The source had nothing more to offer.
    Exhausted,
    /// `grouping.max_rounds` fetch rounds were issued.
    RoundLimit,
    /// `grouping.max_candidates` candidates were examined.
    CandidateLimit,
    /// The request was cancelled through its guard.
    Cancelled,
    /// The request deadline passed.
    TimedOut,
}

impl Termination {
    /// Returns true when the result may be short of the requested quotas.
    #[must_use]
    pub const fn is_partial(self) -> bool {
        !matches!(self, Self::Complete)
    }
}

/// Counters collected while grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Fetch rounds issued.
    pub rounds: usize,
    /// Candidates received from the source.
    pub candidates_examined: usize,
    /// Candidates placed into a group.
    pub accepted: usize,
    /// Candidates already grouped.
    pub duplicates: usize,
    /// Candidates without a usable group key.
    pub no_key: usize,
    /// Candidates whose group was full.
    pub group_full: usize,
    /// Candidates that would have opened a group past `limit`.
    pub capacity_reached: usize,
}

impl GroupingStats {
    fn record(&mut self, outcome: OfferOutcome) {
        self.candidates_examined += 1;
        match outcome {
            OfferOutcome::Accepted => self.accepted += 1,
            OfferOutcome::RejectedDuplicate => self.duplicates += 1,
            OfferOutcome::RejectedNoKey => self.no_key += 1,
            OfferOutcome::RejectedGroupFull => self.group_full += 1,
            OfferOutcome::RejectedGroupCapacityReached => self.capacity_reached += 1,
        }
    }

    /// Candidates rejected for any reason.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.candidates_examined - self.accepted
    }
}

/// Result of a grouping request with its termination reason and counters.
#[derive(Debug, Clone)]
pub struct GroupOutcome {
    /// The groups.
    pub result: GroupsResult,
    /// Why the scheduler stopped.
    pub termination: Termination,
    /// Round and offer counters.
    pub stats: GroupingStats,
}

/// Fetch size schedule.
///
/// Starts at `limit * per_group * oversampling`; after an unsatisfied round
/// the next size is the larger of the geometric step and the oversampled
/// deficit. Always within `[min_batch, max_batch]`.
#[derive(Debug, Clone)]
pub(crate) struct FetchPlan {
    oversampling: usize,
    growth_factor: usize,
    min_batch: usize,
    max_batch: usize,
    next: usize,
}

impl FetchPlan {
    pub(crate) fn new(config: &GroupingConfig, limit: usize, per_group: usize) -> Self {
        let min_batch = config.min_batch.max(1);
        let max_batch = config.max_batch.max(min_batch);
        let initial = limit
            .saturating_mul(per_group)
            .saturating_mul(config.oversampling)
            .clamp(min_batch, max_batch);
        Self {
            oversampling: config.oversampling,
            growth_factor: config.growth_factor,
            min_batch,
            max_batch,
            next: initial,
        }
    }

    pub(crate) fn current(&self) -> usize {
        self.next
    }

    pub(crate) fn grow(&mut self, deficit: usize) {
        let geometric = self.next.saturating_mul(self.growth_factor);
        let needed = deficit.saturating_mul(self.oversampling);
        self.next = geometric.max(needed).clamp(self.min_batch, self.max_batch);
    }
}

enum State {
    Fetching,
    Evaluating(CandidateBatch),
}

/// The grouping engine.
///
/// Holds configuration only; every call works on request-local state, so a
/// single engine can serve concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct GroupSearch {
    grouping: GroupingConfig,
    limits: LimitsConfig,
}

impl GroupSearch {
    /// Creates an engine from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` fails
    /// [`GroupSearchConfig::validate`].
    pub fn new(config: &GroupSearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            grouping: config.grouping.clone(),
            limits: config.limits.clone(),
        })
    }

    /// Scheduler configuration in use.
    #[must_use]
    pub fn grouping_config(&self) -> &GroupingConfig {
        &self.grouping
    }

    /// Groups candidates from `source` and returns the groups.
    ///
    /// # Errors
    ///
    /// Validation errors before any fetch, or the source's own error.
    pub fn search_groups<S>(&self, source: &S, request: &GroupRequest) -> Result<GroupsResult>
    where
        S: CandidateSource + ?Sized,
    {
        self.run(source, request).map(|outcome| outcome.result)
    }

    /// Groups candidates from `source` with a guard built from the configured
    /// timeout.
    ///
    /// # Errors
    ///
    /// Validation errors before any fetch, or the source's own error.
    pub fn run<S>(&self, source: &S, request: &GroupRequest) -> Result<GroupOutcome>
    where
        S: CandidateSource + ?Sized,
    {
        let guard = RequestGuard::new(self.grouping.timeout());
        self.run_guarded(source, request, &guard)
    }

    /// Groups candidates from `source` under an explicit guard.
    ///
    /// A tripped guard is not an error: the groups formed so far are
    /// returned with [`Termination::Cancelled`] or [`Termination::TimedOut`].
    ///
    /// # Errors
    ///
    /// Validation errors before any fetch, or the source's own error.
    pub fn run_guarded<S>(
        &self,
        source: &S,
        request: &GroupRequest,
        guard: &RequestGuard,
    ) -> Result<GroupOutcome>
    where
        S: CandidateSource + ?Sized,
    {
        let path = request.validate(&self.limits)?;
        let limit = request.limit;
        let per_group = request.per_group;

        let mut accumulator = GroupAccumulator::new(path.clone(), limit, per_group);
        let mut exclude: FxHashSet<PointId> = FxHashSet::default();
        let mut plan = FetchPlan::new(&self.grouping, limit, per_group);
        let mut stats = GroupingStats::default();
        let mut next_rank: u64 = 0;
        let mut state = State::Fetching;

        let termination = loop {
            state = match state {
                State::Fetching => {
                    if let Err(trip) = guard.check() {
                        tracing::debug!(
                            group_by = %path,
                            rounds = stats.rounds,
                            reason = %trip,
                            "grouping stopped by request guard"
                        );
                        break match trip {
                            GuardTrip::Cancelled => Termination::Cancelled,
                            GuardTrip::DeadlineExceeded { .. } => Termination::TimedOut,
                        };
                    }

                    if stats.rounds >= self.grouping.max_rounds {
                        tracing::warn!(
                            group_by = %path,
                            rounds = stats.rounds,
                            groups = accumulator.group_count(),
                            "grouping stopped at round limit"
                        );
                        break Termination::RoundLimit;
                    }

                    let remaining = self
                        .grouping
                        .max_candidates
                        .saturating_sub(stats.candidates_examined);
                    if remaining == 0 {
                        tracing::warn!(
                            group_by = %path,
                            examined = stats.candidates_examined,
                            groups = accumulator.group_count(),
                            "grouping stopped at candidate limit"
                        );
                        break Termination::CandidateLimit;
                    }

                    let fetch = FetchRequest {
                        query: &request.query,
                        exclude: &exclude,
                        limit: plan.current().min(remaining),
                        filter: request.filter.as_ref(),
                        score_threshold: request.score_threshold,
                        hints: GroupHints {
                            group_by: Some(&path),
                            full_keys: Some(accumulator.full_keys()),
                            open_keys: accumulator.open_keys(),
                        },
                    };
                    let batch = source.fetch(&fetch)?;
                    stats.rounds += 1;
                    State::Evaluating(batch)
                }
                State::Evaluating(batch) => {
                    let received = batch.points.len();
                    for scored in batch.points {
                        exclude.insert(scored.id());
                        let candidate = Candidate::new(scored, next_rank);
                        next_rank += 1;
                        let id = candidate.id();
                        let outcome = accumulator.offer(candidate);
                        if !outcome.is_accepted() {
                            tracing::trace!(%id, ?outcome, "candidate rejected");
                        }
                        stats.record(outcome);
                    }

                    tracing::debug!(
                        group_by = %path,
                        round = stats.rounds,
                        fetch_size = plan.current(),
                        received,
                        groups = accumulator.group_count(),
                        full_groups = accumulator.full_group_count(),
                        exhausted = batch.exhausted,
                        "grouping round evaluated"
                    );

                    if accumulator.is_complete() {
                        break Termination::Complete;
                    }
                    // An empty batch can never make progress.
                    if batch.exhausted || received == 0 {
                        break Termination::Exhausted;
                    }

                    plan.grow(accumulator.deficit());
                    State::Fetching
                }
            };
        };

        let mut groups = accumulator.into_sorted_groups();
        if groups.len() > limit {
            debug_assert!(false, "accumulator formed more than `limit` groups");
            tracing::error!(
                formed = groups.len(),
                limit,
                "accumulator formed more groups than requested"
            );
            groups.truncate(limit);
        }
        if groups.iter().any(|g| g.len() > per_group || g.is_empty()) {
            return Err(Error::Internal(format!(
                "group size invariant violated for group_by '{path}'"
            )));
        }

        let result = GroupsResult {
            groups: groups
                .into_iter()
                .map(|g| {
                    PointGroup::from_group(g, path.as_str(), request.with_payload, request.with_vector)
                })
                .collect(),
        };

        tracing::info!(
            group_by = %path,
            ?termination,
            groups = result.len(),
            rounds = stats.rounds,
            examined = stats.candidates_examined,
            accepted = stats.accepted,
            "grouping finished"
        );

        Ok(GroupOutcome {
            result,
            termination,
            stats,
        })
    }
}
