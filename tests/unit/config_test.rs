//! Tests for configuration validation

use studio_reservations::config::{CoordinatorConfig, StudioConfig};

#[test]
fn test_default_config_is_valid() {
    assert!(StudioConfig::default().validate().is_ok());
}

#[test]
fn test_invalid_booking_cost() {
    let cfg = CoordinatorConfig {
        booking_cost: 0,
        ..CoordinatorConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_txn_attempts() {
    let cfg = CoordinatorConfig {
        max_txn_attempts: 0,
        ..CoordinatorConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_lock_timeout() {
    let cfg = CoordinatorConfig {
        lock_timeout_ms: 0,
        ..CoordinatorConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_waitlist_depth() {
    let cfg = CoordinatorConfig {
        max_waitlist_depth: 0,
        ..CoordinatorConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_event_buffer() {
    let cfg = CoordinatorConfig {
        event_buffer: 0,
        ..CoordinatorConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_limits_conversion() {
    let cfg = CoordinatorConfig {
        booking_cost: 2,
        max_txn_attempts: 5,
        lock_timeout_ms: 25,
        ..CoordinatorConfig::default()
    };
    let limits = cfg.limits();
    assert_eq!(limits.booking_cost, 2);
    assert_eq!(limits.max_txn_attempts, 5);
    assert_eq!(limits.lock_timeout.as_millis(), 25);
}

#[test]
fn test_studio_config_from_json() {
    let json = r#"{
        "coordinator": {
            "booking_cost": 1,
            "max_txn_attempts": 3,
            "lock_timeout_ms": 50,
            "max_waitlist_depth": 100,
            "event_buffer": 1024
        }
    }"#;
    assert!(StudioConfig::from_json_str(json).is_ok());
}

#[test]
fn test_studio_config_from_json_rejects_invalid() {
    let json = r#"{
        "coordinator": {
            "booking_cost": 0,
            "max_txn_attempts": 3,
            "lock_timeout_ms": 50,
            "max_waitlist_depth": 100,
            "event_buffer": 1024
        }
    }"#;
    assert!(StudioConfig::from_json_str(json).is_err());
}

#[test]
fn test_studio_config_from_json_parse_error() {
    assert!(StudioConfig::from_json_str("not json").is_err());
}
