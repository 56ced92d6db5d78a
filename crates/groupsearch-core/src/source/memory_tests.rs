//! Tests for `InMemoryCollection`.

use rustc_hash::FxHashSet;
use serde_json::json;

use super::memory::{DistanceMetric, InMemoryCollection};
use super::{CandidateSource, FetchRequest, GroupHints};
use crate::error::Error;
use crate::filter::{Condition, Filter};
use crate::group::{GroupByPath, GroupKeyValue, GroupQuery};
use crate::point::{Point, PointId};

fn collection() -> InMemoryCollection {
    let collection = InMemoryCollection::new(2, DistanceMetric::Cosine);
    collection
        .upsert([
            Point::new(1_u64, vec![1.0, 0.0], Some(json!({"docId": "a", "lang": "en"}))),
            Point::new(2_u64, vec![0.9, 0.1], Some(json!({"docId": "a", "lang": "fr"}))),
            Point::new(3_u64, vec![0.5, 0.5], Some(json!({"docId": "b", "lang": "en"}))),
            Point::new(4_u64, vec![0.0, 1.0], Some(json!({"docId": "c"}))),
        ])
        .expect("valid points");
    collection
}

fn ids(batch: &super::CandidateBatch) -> Vec<PointId> {
    batch.points.iter().map(|p| p.id()).collect()
}

fn key_set(keys: &[&str]) -> FxHashSet<GroupKeyValue> {
    keys.iter().map(|k| GroupKeyValue::from(*k)).collect()
}

#[test]
fn test_metric_similarity() {
    let cos = DistanceMetric::Cosine.similarity(&[1.0, 0.0], &[2.0, 0.0]);
    let dot = DistanceMetric::DotProduct.similarity(&[1.0, 2.0], &[3.0, 4.0]);
    let zero = DistanceMetric::Cosine.similarity(&[0.0, 0.0], &[1.0, 0.0]);

    assert!((cos - 1.0).abs() < 1e-6);
    assert!((dot - 11.0).abs() < 1e-6);
    assert!(zero.abs() < f32::EPSILON);
}

#[test]
fn test_metric_serde_names() {
    let metric: DistanceMetric = serde_json::from_value(json!("dot")).expect("alias");
    assert_eq!(metric, DistanceMetric::DotProduct);
    assert_eq!(
        serde_json::to_value(DistanceMetric::Cosine).expect("serialize"),
        json!("cosine")
    );
}

#[test]
fn test_upsert_rejects_wrong_dimension_atomically() {
    // Arrange
    let collection = InMemoryCollection::new(2, DistanceMetric::Cosine);

    // Act
    let err = collection
        .upsert([
            Point::without_payload(1_u64, vec![1.0, 0.0]),
            Point::without_payload(2_u64, vec![1.0]),
        ])
        .expect_err("dimension mismatch");

    // Assert
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 2,
            actual: 1
        }
    ));
    assert!(collection.is_empty());
}

#[test]
fn test_upsert_replaces_existing() {
    let collection = collection();
    collection
        .upsert([Point::without_payload(1_u64, vec![0.0, 1.0])])
        .expect("valid point");

    assert_eq!(collection.len(), 4);
    let point = collection.get(PointId::Num(1)).expect("stored");
    assert!(point.payload.is_none());
}

#[test]
fn test_fetch_orders_by_score_and_reports_exhaustion() {
    let collection = collection();
    let query = GroupQuery::nearest(vec![1.0, 0.0]);
    let exclude = FxHashSet::default();

    let first = collection
        .fetch(&FetchRequest::new(&query, &exclude, 2))
        .expect("fetch");
    let all = collection
        .fetch(&FetchRequest::new(&query, &exclude, 10))
        .expect("fetch");

    assert_eq!(ids(&first), [PointId::Num(1), PointId::Num(2)]);
    assert!(!first.exhausted);
    assert_eq!(all.points.len(), 4);
    assert!(all.exhausted);
    assert!(all.points.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_fetch_honors_exclusion() {
    let collection = collection();
    let query = GroupQuery::nearest(vec![1.0, 0.0]);
    let exclude: FxHashSet<PointId> = [PointId::Num(1), PointId::Num(2)].into_iter().collect();

    let batch = collection
        .fetch(&FetchRequest::new(&query, &exclude, 1))
        .expect("fetch");

    assert_eq!(ids(&batch), [PointId::Num(3)]);
}

#[test]
fn test_fetch_applies_filter_and_threshold() {
    // Arrange
    let collection = collection();
    let query = GroupQuery::nearest(vec![1.0, 0.0]);
    let exclude = FxHashSet::default();
    let filter = Filter::new(Condition::eq("lang", "en"));
    let mut request = FetchRequest::new(&query, &exclude, 10);
    request.filter = Some(&filter);
    request.score_threshold = Some(0.5);

    // Act
    let batch = collection.fetch(&request).expect("fetch");

    // Assert: point 3 is english but cos = 0.707, point 4 has no lang.
    assert_eq!(ids(&batch), [PointId::Num(1), PointId::Num(3)]);

    request.score_threshold = Some(0.8);
    let batch = collection.fetch(&request).expect("fetch");
    assert_eq!(ids(&batch), [PointId::Num(1)]);
}

#[test]
fn test_fetch_uses_group_hints() {
    let collection = collection();
    let query = GroupQuery::nearest(vec![1.0, 0.0]);
    let exclude = FxHashSet::default();
    let path = GroupByPath::parse("docId").expect("valid path");
    let full = key_set(&["a"]);
    let open = key_set(&["c"]);
    let mut request = FetchRequest::new(&query, &exclude, 10);
    request.hints = GroupHints {
        group_by: Some(&path),
        full_keys: Some(&full),
        open_keys: None,
    };

    let batch = collection.fetch(&request).expect("fetch");
    assert_eq!(ids(&batch), [PointId::Num(3), PointId::Num(4)]);

    request.hints.open_keys = Some(&open);
    let batch = collection.fetch(&request).expect("fetch");
    assert_eq!(ids(&batch), [PointId::Num(4)]);
}

#[test]
fn test_hints_admit_keyless_payloads() {
    let path = GroupByPath::parse("docId").expect("valid path");
    let full = key_set(&["a"]);
    let open = FxHashSet::default();
    let hints = GroupHints {
        group_by: Some(&path),
        full_keys: Some(&full),
        open_keys: Some(&open),
    };

    assert!(hints.admits(None));
    assert!(hints.admits(Some(&json!({"other": 1}))));
    assert!(!hints.admits(Some(&json!({"docId": "a"}))));
    assert!(!hints.admits(Some(&json!({"docId": "z"}))));
}

#[test]
fn test_recommend_excludes_examples() {
    let collection = collection();
    let query = GroupQuery::recommend(vec![PointId::Num(1)], vec![PointId::Num(4)]);
    let exclude = FxHashSet::default();

    let batch = collection
        .fetch(&FetchRequest::new(&query, &exclude, 10))
        .expect("fetch");

    assert_eq!(ids(&batch), [PointId::Num(2), PointId::Num(3)]);
}

#[test]
fn test_recommend_unknown_example() {
    let collection = collection();
    let query = GroupQuery::recommend(vec![PointId::Num(99)], vec![]);
    let exclude = FxHashSet::default();

    let err = collection
        .fetch(&FetchRequest::new(&query, &exclude, 10))
        .expect_err("unknown id");

    assert!(matches!(err, Error::PointNotFound(PointId::Num(99))));
}

#[test]
fn test_nearest_wrong_dimension() {
    let collection = collection();
    let query = GroupQuery::nearest(vec![1.0, 0.0, 0.0]);
    let exclude = FxHashSet::default();

    let err = collection
        .fetch(&FetchRequest::new(&query, &exclude, 10))
        .expect_err("dimension mismatch");

    assert_eq!(err.kind(), "dimension_mismatch");
}

#[test]
fn test_search_groups_shortcut() {
    let collection = collection();
    let request = crate::group::GroupRequest::new(
        GroupQuery::nearest(vec![1.0, 0.0]),
        "docId",
        2,
        2,
    );

    let result = collection.search_groups(&request).expect("grouping succeeds");

    assert_eq!(result.len(), 2);
    assert_eq!(result.groups[0].hits.len(), 2);
    assert_eq!(result.groups[1].hits.len(), 1);
}
