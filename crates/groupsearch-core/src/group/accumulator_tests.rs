//! Tests for `GroupAccumulator`.
#![allow(clippy::cast_precision_loss)]

use super::accumulator::{GroupAccumulator, OfferOutcome};
use super::candidate::Candidate;
use super::key::GroupKeyValue;
use super::path::GroupByPath;
use crate::point::{Point, PointId, ScoredPoint};
use serde_json::json;

fn candidate(id: u64, score: f32, rank: u64, key: serde_json::Value) -> Candidate {
    let point = Point::new(id, vec![0.0], Some(json!({ "docId": key })));
    Candidate::new(ScoredPoint::new(point, score), rank)
}

fn accumulator(limit: usize, per_group: usize) -> GroupAccumulator {
    GroupAccumulator::new(GroupByPath::parse("docId").expect("valid path"), limit, per_group)
}

#[test]
fn test_offer_opens_and_fills_groups() {
    // Arrange
    let mut acc = accumulator(2, 2);

    // Act
    let outcomes = [
        acc.offer(candidate(1, 0.9, 0, json!("a"))),
        acc.offer(candidate(2, 0.8, 1, json!("a"))),
        acc.offer(candidate(3, 0.7, 2, json!("b"))),
    ];

    // Assert
    assert!(outcomes.iter().all(|o| o.is_accepted()));
    assert_eq!(acc.group_count(), 2);
    assert_eq!(acc.full_group_count(), 1);
    assert_eq!(acc.assigned_count(), 3);
    assert!(!acc.is_complete());
    assert_eq!(acc.deficit(), 1);
}

#[test]
fn test_offer_rejection_reasons() {
    let mut acc = accumulator(1, 1);

    assert_eq!(acc.offer(candidate(1, 0.9, 0, json!("a"))), OfferOutcome::Accepted);
    assert_eq!(
        acc.offer(candidate(1, 0.9, 1, json!("a"))),
        OfferOutcome::RejectedDuplicate
    );
    assert_eq!(
        acc.offer(candidate(2, 0.8, 2, json!(null))),
        OfferOutcome::RejectedNoKey
    );
    assert_eq!(
        acc.offer(candidate(3, 0.7, 3, json!("a"))),
        OfferOutcome::RejectedGroupFull
    );
    assert_eq!(
        acc.offer(candidate(4, 0.6, 4, json!("b"))),
        OfferOutcome::RejectedGroupCapacityReached
    );
    assert!(acc.is_complete());
}

#[test]
fn test_duplicate_checked_before_key() {
    let mut acc = accumulator(3, 3);
    acc.offer(candidate(1, 0.9, 0, json!("a")));

    // Same id with a different key is still a duplicate.
    assert_eq!(
        acc.offer(candidate(1, 0.9, 1, json!("b"))),
        OfferOutcome::RejectedDuplicate
    );
    assert_eq!(acc.group_count(), 1);
}

#[test]
fn test_payload_missing_is_no_key() {
    let mut acc = accumulator(3, 3);
    let point = Point::without_payload(7_u64, vec![1.0]);

    let outcome = acc.offer(Candidate::new(ScoredPoint::new(point, 1.0), 0));

    assert_eq!(outcome, OfferOutcome::RejectedNoKey);
    assert_eq!(acc.assigned_count(), 0);
}

#[test]
fn test_late_better_hit_is_merged_in_order() {
    // Arrange
    let mut acc = accumulator(1, 3);
    acc.offer(candidate(1, 0.5, 0, json!("a")));
    acc.offer(candidate(2, 0.3, 1, json!("a")));

    // Act
    acc.offer(candidate(3, 0.9, 2, json!("a")));

    // Assert
    let group = acc.groups().next().expect("one group");
    let ids: Vec<_> = group.hits().iter().map(|c| c.id()).collect();
    assert_eq!(ids, [PointId::Num(3), PointId::Num(1), PointId::Num(2)]);
}

#[test]
fn test_equal_scores_keep_delivery_order() {
    let mut acc = accumulator(1, 3);
    acc.offer(candidate(9, 0.5, 0, json!("a")));
    acc.offer(candidate(2, 0.5, 1, json!("a")));
    acc.offer(candidate(5, 0.5, 2, json!("a")));

    let group = acc.groups().next().expect("one group");
    let ids: Vec<_> = group.hits().iter().map(|c| c.id()).collect();
    assert_eq!(ids, [PointId::Num(9), PointId::Num(2), PointId::Num(5)]);
}

#[test]
fn test_full_and_open_keys() {
    let mut acc = accumulator(2, 2);
    acc.offer(candidate(1, 0.9, 0, json!("a")));
    acc.offer(candidate(2, 0.9, 1, json!("a")));
    assert_eq!(acc.full_keys().len(), 1);
    assert!(acc.full_keys().contains(&GroupKeyValue::from("a")));
    assert_eq!(acc.open_keys(), None);

    acc.offer(candidate(3, 0.8, 2, json!("b")));
    let open = acc.open_keys().expect("limit groups formed");
    assert_eq!(open.len(), 1);
    assert!(open.contains(&GroupKeyValue::from("b")));

    // Filling "b" moves it from open to full.
    acc.offer(candidate(4, 0.7, 3, json!("b")));
    assert_eq!(acc.full_keys().len(), 2);
    assert!(acc.open_keys().is_some_and(|open| open.is_empty()));
    assert!(acc.is_complete());
}

#[test]
fn test_single_slot_groups_are_full_on_creation() {
    let mut acc = accumulator(2, 1);
    acc.offer(candidate(1, 0.9, 0, json!("a")));

    assert!(acc.full_keys().contains(&GroupKeyValue::from("a")));
    assert_eq!(acc.full_group_count(), 1);
    assert_eq!(acc.open_keys(), None);
}

#[test]
fn test_deficit_counts_missing_groups() {
    let mut acc = accumulator(3, 2);
    assert_eq!(acc.deficit(), 6);

    acc.offer(candidate(1, 0.9, 0, json!("a")));
    assert_eq!(acc.deficit(), 5);
}

#[test]
fn test_into_sorted_groups_orders_by_best_hit() {
    // Arrange
    let mut acc = accumulator(3, 2);
    acc.offer(candidate(1, 0.4, 0, json!("low")));
    acc.offer(candidate(2, 0.9, 1, json!("high")));
    acc.offer(candidate(3, 0.6, 2, json!("mid")));

    // Act
    let keys: Vec<_> = acc
        .into_sorted_groups()
        .iter()
        .map(|g| g.key().clone())
        .collect();

    // Assert
    assert_eq!(
        keys,
        [
            GroupKeyValue::from("high"),
            GroupKeyValue::from("mid"),
            GroupKeyValue::from("low")
        ]
    );
}

#[test]
fn test_numeric_and_string_keys_form_distinct_groups() {
    let mut acc = accumulator(5, 1);
    acc.offer(candidate(1, 0.9, 0, json!(1)));
    acc.offer(candidate(2, 0.9, 1, json!("1")));
    acc.offer(candidate(3, 0.9, 2, json!(true)));

    assert_eq!(acc.group_count(), 3);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Property: quotas hold, ids are unique and hits stay ordered
        /// whatever the offer sequence.
        #[test]
        fn prop_quotas_and_uniqueness(
            limit in 1usize..=6,
            per_group in 1usize..=4,
            offers in proptest::collection::vec((0u64..40, 0u8..8, 0.0f32..1.0), 0..120)
        ) {
            let mut acc = accumulator(limit, per_group);
            for (rank, (id, key, score)) in offers.into_iter().enumerate() {
                acc.offer(candidate(id, score, rank as u64, json!(format!("k{key}"))));
            }

            prop_assert!(acc.group_count() <= limit);
            let mut seen = HashSet::new();
            for group in acc.groups() {
                prop_assert!(!group.is_empty());
                prop_assert!(group.len() <= per_group);
                for pair in group.hits().windows(2) {
                    prop_assert!(pair[0].rank_order(&pair[1]).is_lt());
                }
                for hit in group.hits() {
                    prop_assert!(seen.insert(hit.id()), "id {} in two groups", hit.id());
                }
            }
            prop_assert_eq!(seen.len(), acc.assigned_count());
        }

        /// Property: every hit's key equals its group's key.
        #[test]
        fn prop_hits_share_group_key(
            offers in proptest::collection::vec((0u64..30, 0u8..5), 0..60)
        ) {
            let mut acc = accumulator(3, 3);
            let mut keys = HashMap::new();
            for (rank, (id, key)) in offers.into_iter().enumerate() {
                if acc.offer(candidate(id, 0.5, rank as u64, json!(key))).is_accepted() {
                    keys.insert(id, GroupKeyValue::from(u64::from(key)));
                }
            }

            for group in acc.groups() {
                for hit in group.hits() {
                    let PointId::Num(id) = hit.id() else {
                        unreachable!("numeric ids only");
                    };
                    prop_assert_eq!(keys.get(&id), Some(group.key()));
                }
            }
        }
    }
}
