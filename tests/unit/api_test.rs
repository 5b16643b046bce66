//! Tests for the API dispatch layer

use chrono::{DateTime, TimeZone, Utc};
use studio_reservations::builders::build_coordinator;
use studio_reservations::config::StudioConfig;
use studio_reservations::core::{BookingError, Caller, NewClass, TransactionCoordinator};
use studio_reservations::runtime::api;
use studio_reservations::runtime::{ErrorResponse, MemberRequest, TopUpRequest};
use studio_reservations::util::ids::{ClassId, UserId};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap()
}

fn make_class(
    coordinator: &TransactionCoordinator,
    operator: &Caller,
    day: u32,
    capacity: u32,
) -> ClassId {
    api::create_class(
        coordinator,
        operator,
        NewClass {
            name: "Spin".into(),
            description: None,
            trainer: None,
            starts_at: Utc.with_ymd_and_hms(2026, 9, day, 18, 0, 0).unwrap(),
            capacity,
        },
    )
    .unwrap()
    .id
}

#[test]
fn test_health() {
    assert!(api::health().ok);
}

#[test]
fn test_member_book_and_cancel_flow() {
    let coordinator = build_coordinator(&StudioConfig::default(), []).unwrap();
    let operator = Caller::operator(UserId::new());
    let class_id = make_class(&coordinator, &operator, 14, 3);
    let req = MemberRequest {
        user_id: UserId::new(),
        class_id,
    };

    let booked = api::book(&coordinator, &req, now()).unwrap();
    assert_eq!(booked.occupancy, 1);
    assert_eq!(booked.balance, -1);

    let cancelled = api::cancel(&coordinator, &req, now()).unwrap();
    assert_eq!(cancelled.occupancy, 0);
    assert_eq!(cancelled.balance, 0);
}

#[test]
fn test_waitlist_flow() {
    let coordinator = build_coordinator(&StudioConfig::default(), []).unwrap();
    let operator = Caller::operator(UserId::new());
    let class_id = make_class(&coordinator, &operator, 14, 1);

    api::book(
        &coordinator,
        &MemberRequest {
            user_id: UserId::new(),
            class_id,
        },
        now(),
    )
    .unwrap();

    let req = MemberRequest {
        user_id: UserId::new(),
        class_id,
    };
    let joined = api::join_waitlist(&coordinator, &req, now()).unwrap();
    assert_eq!(joined.position, 1);
    api::leave_waitlist(&coordinator, &req).unwrap();
}

#[test]
fn test_admin_flow() {
    let coordinator = build_coordinator(&StudioConfig::default(), []).unwrap();
    let operator = Caller::operator(UserId::new());
    let class_id = make_class(&coordinator, &operator, 14, 3);
    let req = MemberRequest {
        user_id: UserId::new(),
        class_id,
    };

    api::admin_add(&coordinator, &operator, &req).unwrap();
    api::admin_remove(&coordinator, &operator, &req).unwrap();
    api::top_up(
        &coordinator,
        &operator,
        &TopUpRequest {
            user_id: req.user_id,
            amount: 5,
        },
    )
    .unwrap();
    let deleted = api::delete_class(&coordinator, &operator, class_id).unwrap();
    assert!(deleted.refunded.is_empty());
}

#[test]
fn test_list_classes_sorted_by_start() {
    let coordinator = build_coordinator(&StudioConfig::default(), []).unwrap();
    let operator = Caller::operator(UserId::new());
    let later = make_class(&coordinator, &operator, 20, 3);
    let earlier = make_class(&coordinator, &operator, 5, 3);

    let listed = api::list_classes(&coordinator);
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, earlier);
    assert_eq!(listed[1].id, later);
}

#[test]
fn test_list_user_schedule() {
    let coordinator = build_coordinator(&StudioConfig::default(), []).unwrap();
    let operator = Caller::operator(UserId::new());
    let class_a = make_class(&coordinator, &operator, 20, 3);
    let class_b = make_class(&coordinator, &operator, 5, 3);
    let user = UserId::new();

    for class_id in [class_a, class_b] {
        api::book(
            &coordinator,
            &MemberRequest {
                user_id: user,
                class_id,
            },
            now(),
        )
        .unwrap();
    }

    let schedule = api::list_user_schedule(&coordinator, user);
    assert_eq!(schedule.len(), 2);
    assert_eq!(schedule[0].id, class_b);
    assert_eq!(schedule[1].id, class_a);
    assert!(api::list_user_schedule(&coordinator, UserId::new()).is_empty());
}

#[test]
fn test_error_response_mapping() {
    let full = ErrorResponse::from(&BookingError::ClassFull);
    assert!(full.validation);
    assert!(!full.retryable);
    assert_eq!(full.error, "class full");

    let conflict = ErrorResponse::from(&BookingError::TransactionConflict("busy".into()));
    assert!(!conflict.validation);
    assert!(conflict.retryable);
}
