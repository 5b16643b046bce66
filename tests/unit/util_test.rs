//! Tests for shared utilities

use studio_reservations::util::clock::now_ms;
use studio_reservations::util::ids::{ClassId, UserId};
use uuid::Uuid;

#[test]
fn test_now_ms_is_nonzero_and_monotonic_enough() {
    let a = now_ms();
    let b = now_ms();
    assert!(a > 0);
    assert!(b >= a);
}

#[test]
fn test_user_id_display_matches_uuid() {
    let raw = Uuid::new_v4();
    let user = UserId::from_uuid(raw);
    assert_eq!(user.to_string(), raw.to_string());
    assert_eq!(*user.as_uuid(), raw);
}

#[test]
fn test_ids_are_unique() {
    let a = ClassId::new();
    let b = ClassId::new();
    assert_ne!(a, b);
}

#[test]
fn test_id_serde_is_transparent() {
    let user = UserId::new();
    let json = serde_json::to_string(&user).unwrap();
    assert_eq!(json, format!("\"{user}\""));

    let back: UserId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, user);
}
