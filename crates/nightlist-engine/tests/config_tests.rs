#![allow(clippy::unwrap_used, clippy::expect_used)]

use nightlist_core::{ExErrorKind, HeaderPolicy, MoveDetection};
use nightlist_engine::{CoordinatorConfig, SubmissionPolicy};

#[test]
fn test_parse_every_key() {
    let config = CoordinatorConfig::from_toml_str(
        r#"
        header = "when_non_empty"
        moves = "remove_insert"
        submission = "supersede"
        supersede_limit = 1
        event_capacity = 8
        "#,
    )
    .unwrap();

    assert_eq!(config.header, HeaderPolicy::WhenNonEmpty);
    assert_eq!(config.moves, MoveDetection::RemoveInsert);
    assert_eq!(config.submission, SubmissionPolicy::Supersede);
    assert_eq!(config.supersede_limit, 1);
    assert_eq!(config.event_capacity, 8);
    assert_eq!(config.diff_config().moves, MoveDetection::RemoveInsert);
}

#[test]
fn test_partial_document_keeps_other_defaults() {
    let config = CoordinatorConfig::from_toml_str("submission = \"queue\"").unwrap();
    assert_eq!(config.submission, SubmissionPolicy::Queue);
    assert_eq!(config.header, HeaderPolicy::Always);
    assert_eq!(config.supersede_limit, 3);
    assert_eq!(config.event_capacity, 64);
}

#[test]
fn test_unknown_key_is_rejected() {
    let err = CoordinatorConfig::from_toml_str("headers = \"never\"").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Configuration);
    assert_eq!(err.op(), Some("load_config"));
}

#[test]
fn test_unknown_policy_value_is_rejected() {
    let err = CoordinatorConfig::from_toml_str("submission = \"newest\"").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Configuration);
}

#[test]
fn test_zero_event_capacity_is_rejected() {
    let err = CoordinatorConfig::from_toml_str("event_capacity = 0").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Configuration);
    assert!(err.message().contains("event_capacity"));
}
