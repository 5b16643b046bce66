//! Tests for the event sink

use studio_reservations::core::{build_event, EventKind, EventSink, InMemoryEventSink};
use studio_reservations::util::ids::{ClassId, UserId};

#[test]
fn test_in_memory_event_sink() {
    let mut sink = InMemoryEventSink::new(10);
    let class = ClassId::new();
    let user = UserId::new();

    sink.publish(build_event(
        EventKind::ClassChanged,
        Some(class),
        None,
        Some("2026-09".into()),
    ));
    sink.publish(build_event(EventKind::UserChanged, None, Some(user), None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, EventKind::ClassChanged);
    assert_eq!(events[0].class_id, Some(class));
    assert_eq!(events[0].month_key.as_deref(), Some("2026-09"));
    assert_eq!(events[1].user_id, Some(user));
}

#[test]
fn test_event_sink_overflow() {
    let mut sink = InMemoryEventSink::new(2);
    let classes: Vec<ClassId> = (0..3).map(|_| ClassId::new()).collect();

    for class in &classes {
        sink.publish(build_event(EventKind::ClassChanged, Some(*class), None, None));
    }

    let events = sink.events();
    assert_eq!(events.len(), 2);
    // First one popped.
    assert_eq!(events[0].class_id, Some(classes[1]));
    assert_eq!(events[1].class_id, Some(classes[2]));
}

#[test]
fn test_build_event() {
    let class = ClassId::new();
    let user = UserId::new();
    let event = build_event(
        EventKind::UserPromoted,
        Some(class),
        Some(user),
        Some("2026-10".into()),
    );

    assert_eq!(event.kind, EventKind::UserPromoted);
    assert_eq!(event.class_id, Some(class));
    assert_eq!(event.user_id, Some(user));
    assert_eq!(event.month_key.as_deref(), Some("2026-10"));
    assert!(event.created_at_ms > 0);
}

#[test]
fn test_event_serde_round_trip() {
    let event = build_event(EventKind::SlotFreed, Some(ClassId::new()), None, None);
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("slot_freed"));
}
