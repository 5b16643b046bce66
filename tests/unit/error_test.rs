//! Tests for error types

use studio_reservations::core::BookingError;
use studio_reservations::util::ids::ClassId;

#[test]
fn test_class_not_found_error() {
    let id = ClassId::new();
    let err = BookingError::ClassNotFound(id);
    assert_eq!(format!("{err}"), format!("class not found: {id}"));
}

#[test]
fn test_class_full_error() {
    let err = BookingError::ClassFull;
    assert_eq!(format!("{err}"), "class full");
}

#[test]
fn test_transaction_conflict_error() {
    let err = BookingError::TransactionConflict("class busy".to_string());
    assert_eq!(format!("{err}"), "transaction conflict: class busy");
}

#[test]
fn test_capacity_exceeded_error() {
    let err = BookingError::CapacityExceeded("occupancy 6 > capacity 5".to_string());
    assert_eq!(
        format!("{err}"),
        "capacity invariant violated: occupancy 6 > capacity 5"
    );
}

#[test]
fn test_validation_classification() {
    assert!(BookingError::AlreadyBooked.is_validation());
    assert!(BookingError::ClassFull.is_validation());
    assert!(BookingError::NotWaitlisted.is_validation());
    assert!(BookingError::Forbidden.is_validation());
    assert!(BookingError::RequestInFlight.is_validation());
    assert!(!BookingError::TransactionConflict(String::new()).is_validation());
    assert!(!BookingError::CapacityExceeded(String::new()).is_validation());
}

#[test]
fn test_retryable_classification() {
    assert!(BookingError::TransactionConflict(String::new()).is_retryable());
    assert!(!BookingError::ClassFull.is_retryable());
    assert!(!BookingError::CapacityExceeded(String::new()).is_retryable());
}

#[test]
fn test_fatal_classification() {
    assert!(BookingError::CapacityExceeded(String::new()).is_fatal());
    assert!(!BookingError::AlreadyBooked.is_fatal());
    assert!(!BookingError::TransactionConflict(String::new()).is_fatal());
}
