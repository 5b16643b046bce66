//! Tests for coordinator construction from configuration

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use studio_reservations::builders::build_coordinator;
use studio_reservations::config::{CoordinatorConfig, StudioConfig};
use studio_reservations::core::{
    BookingError, Caller, EventSink, InMemoryEventSink, NewClass,
};
use studio_reservations::util::ids::UserId;

#[test]
fn test_build_from_default_config() {
    assert!(build_coordinator(&StudioConfig::default(), []).is_ok());
}

#[test]
fn test_build_rejects_invalid_config() {
    let cfg = StudioConfig {
        coordinator: CoordinatorConfig {
            booking_cost: 0,
            ..CoordinatorConfig::default()
        },
    };
    assert!(matches!(
        build_coordinator(&cfg, []),
        Err(BookingError::InvalidConfig(_))
    ));
}

#[test]
fn test_registered_sink_receives_events() {
    let sink = Arc::new(InMemoryEventSink::new(16));
    let handle: Arc<Mutex<Box<dyn EventSink>>> =
        Arc::new(Mutex::new(Box::new(Arc::clone(&sink))));
    let coordinator = build_coordinator(&StudioConfig::default(), [handle]).unwrap();

    let operator = Caller::operator(UserId::new());
    coordinator
        .create_class(
            &operator,
            NewClass {
                name: "Pilates".into(),
                description: None,
                trainer: None,
                starts_at: Utc.with_ymd_and_hms(2026, 9, 3, 9, 0, 0).unwrap(),
                capacity: 6,
            },
        )
        .unwrap();

    assert_eq!(sink.events().len(), 1);
}

#[test]
fn test_waitlist_depth_comes_from_config() {
    let cfg = StudioConfig {
        coordinator: CoordinatorConfig {
            max_waitlist_depth: 1,
            ..CoordinatorConfig::default()
        },
    };
    let coordinator = build_coordinator(&cfg, []).unwrap();
    let operator = Caller::operator(UserId::new());
    let class = coordinator
        .create_class(
            &operator,
            NewClass {
                name: "Spin".into(),
                description: None,
                trainer: None,
                starts_at: Utc.with_ymd_and_hms(2026, 9, 3, 9, 0, 0).unwrap(),
                capacity: 1,
            },
        )
        .unwrap()
        .id;
    let now = Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap();
    coordinator
        .book_class(UserId::new(), class, now)
        .unwrap();

    coordinator
        .join_waitlist(UserId::new(), class, now)
        .unwrap();
    assert!(matches!(
        coordinator.join_waitlist(UserId::new(), class, now),
        Err(BookingError::WaitlistFull)
    ));
}
