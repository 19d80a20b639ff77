//! Sequence and Config Tests
//!
//! Operation names, sequence parsing and configuration validation.

use std::time::Duration;

use binhammer::config::{Config, Dispatch, KeyMode};
use binhammer::protocol::MAX_BODY_LEN;
use binhammer::workload::parse_sequence;
use binhammer::{HammerError, Operation};

// =============================================================================
// Sequence Parsing Tests
// =============================================================================

#[test]
fn test_parse_default_sequence() {
    let sequence = parse_sequence("insert,fetch,delete").unwrap();
    assert_eq!(sequence, Operation::DEFAULT_SEQUENCE.to_vec());
}

#[test]
fn test_parse_aliases_and_case() {
    let sequence = parse_sequence(" ADD , get,Del,set ").unwrap();
    assert_eq!(
        sequence,
        vec![Operation::Insert, Operation::Fetch, Operation::Delete, Operation::Insert]
    );
}

#[test]
fn test_parse_unknown_operation_is_config_error() {
    match parse_sequence("insert,append") {
        Err(HammerError::Config(msg)) => assert!(msg.contains("append")),
        other => panic!("Expected config error, got {:?}", other),
    }
}

#[test]
fn test_parse_empty_sequence_is_config_error() {
    assert!(matches!(parse_sequence(""), Err(HammerError::Config(_))));
    assert!(matches!(parse_sequence(" , "), Err(HammerError::Config(_))));
}

#[test]
fn test_operation_display_round_trips() {
    for op in Operation::ALL {
        assert_eq!(op.to_string().parse::<Operation>().unwrap(), op);
    }
}

// =============================================================================
// Config Validation Tests
// =============================================================================

#[test]
fn test_default_config_is_valid() {
    let config = Config::default();
    assert_eq!(config.concurrency, 32);
    assert_eq!(config.key_count, 1_000_000);
    assert_eq!(config.value_size, 20);
    assert_eq!(config.report_interval, Duration::from_secs(5));
    assert_eq!(config.dispatch, Dispatch::Partitioned);
    config.validate().unwrap();
}

#[test]
fn test_invalid_configs_are_rejected() {
    let invalid = vec![
        Config::builder().protocol("udp").build(),
        Config::builder().sequence(vec![]).build(),
        Config::builder().flush_every(0).build(),
        Config::builder().pipeline_depth(0).build(),
        Config::builder().quiet(true).build(),
        Config::builder().report_interval(Duration::ZERO).build(),
        Config::builder().dispatch(Dispatch::Shared { queue_depth: 0 }).build(),
        Config::builder().value_size(MAX_BODY_LEN as usize).build(),
    ];

    for config in invalid {
        assert!(
            matches!(config.validate(), Err(HammerError::Config(_))),
            "accepted {:?}",
            config
        );
    }
}

#[test]
fn test_quiet_with_pipeline_is_valid() {
    Config::builder().pipeline_depth(16).quiet(true).build().validate().unwrap();
}

#[test]
fn test_stateful_mode_requires_partitioned_dispatch() {
    let shared = Config::builder()
        .key_mode(KeyMode::Stateful)
        .dispatch(Dispatch::Shared { queue_depth: 100 })
        .build();
    match shared.validate() {
        Err(HammerError::Config(msg)) => assert!(msg.contains("partitioned"), "{}", msg),
        other => panic!("Expected config error, got {:?}", other),
    }

    Config::builder().key_mode(KeyMode::Stateful).build().validate().unwrap();
    Config::builder()
        .dispatch(Dispatch::Shared { queue_depth: 100 })
        .build()
        .validate()
        .unwrap();
}

#[test]
fn test_largest_framed_value_is_valid() {
    // Default key space: longest key is "k999999", plus 8 bytes of extras
    let config = Config::builder()
        .value_size(MAX_BODY_LEN as usize - 8 - 7)
        .build();
    config.validate().unwrap();
}
