//! Tests for group key extraction.

use super::key::{extract_group_key, GroupKeyValue};
use super::path::GroupByPath;
use serde_json::json;

fn key_of(payload: serde_json::Value, path: &str) -> Option<GroupKeyValue> {
    let path = GroupByPath::parse(path).expect("valid path");
    extract_group_key(&payload, &path)
}

#[test]
fn test_scalar_keys_keep_their_type() {
    assert_eq!(key_of(json!({"k": "a"}), "k"), Some(GroupKeyValue::from("a")));
    assert_eq!(key_of(json!({"k": 2}), "k"), Some(GroupKeyValue::from(2_i64)));
    assert_eq!(key_of(json!({"k": true}), "k"), Some(GroupKeyValue::from(true)));
}

#[test]
fn test_string_and_number_keys_differ() {
    let number = key_of(json!({"k": 1}), "k");
    let string = key_of(json!({"k": "1"}), "k");

    assert!(number.is_some());
    assert_ne!(number, string);
}

#[test]
fn test_integer_and_float_keys_differ() {
    assert_ne!(key_of(json!({"k": 1}), "k"), key_of(json!({"k": 1.0}), "k"));
}

#[test]
fn test_array_uses_first_element() {
    let key = key_of(json!({"compoundId": ["valid_3", "unused"]}), "compoundId");
    assert_eq!(key, Some(GroupKeyValue::from("valid_3")));
}

#[test]
fn test_array_first_element_equals_plain_scalar() {
    assert_eq!(key_of(json!({"k": [7, 8]}), "k"), key_of(json!({"k": 7}), "k"));
}

#[test]
fn test_heterogeneous_values() {
    // Arrange: one payload per shape a key field can take.
    let cases = [
        (json!({"heterogenousId": "a"}), Some(GroupKeyValue::from("a"))),
        (json!({"heterogenousId": 1}), Some(GroupKeyValue::from(1_i64))),
        (json!({"heterogenousId": ["a", "b"]}), Some(GroupKeyValue::from("a"))),
        (json!({"heterogenousId": [1, 2]}), Some(GroupKeyValue::from(1_i64))),
        (json!({"heterogenousId": {"a": 1}}), None),
        (json!({"heterogenousId": null}), None),
        (json!({"heterogenousId": []}), None),
        (json!({"heterogenousId": [[1]]}), None),
        (json!({"heterogenousId": [{"a": 1}]}), None),
        (json!({}), None),
    ];

    // Act & Assert
    for (payload, expected) in cases {
        assert_eq!(key_of(payload.clone(), "heterogenousId"), expected, "payload {payload}");
    }
}

#[test]
fn test_nested_key() {
    let key = key_of(json!({"meta": {"source": "web"}}), "meta.source");
    assert_eq!(key, Some(GroupKeyValue::from("web")));
}

#[test]
fn test_key_to_json_and_display() {
    let key = GroupKeyValue::from("doc_1");
    assert_eq!(key.to_json(), json!("doc_1"));
    assert_eq!(key.to_string(), "\"doc_1\"");
    assert_eq!(GroupKeyValue::from(3_u64).to_string(), "3");
    assert_eq!(GroupKeyValue::from(false).to_string(), "false");
}

#[test]
fn test_key_serializes_as_plain_json() {
    let json = serde_json::to_string(&GroupKeyValue::from(5_u64)).expect("serialize");
    assert_eq!(json, "5");
    let json = serde_json::to_string(&GroupKeyValue::from("x")).expect("serialize");
    assert_eq!(json, "\"x\"");
}
