//! API-facing request/response models and dispatch helpers.
//!
//! Each helper is a synchronous call-and-result wrapper over one coordinator
//! operation; admin helpers carry the operator context the coordinator
//! authorizes at its boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::catalog::{ClassSnapshot, NewClass};
use crate::core::coordinator::{
    BookingReceipt, Caller, CancellationReceipt, DeleteClassReceipt, TopUpReceipt,
    TransactionCoordinator, WaitlistReceipt,
};
use crate::core::BookingError;
use crate::util::ids::{ClassId, UserId};

/// Member-initiated operation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRequest {
    /// Authenticated member.
    pub user_id: UserId,
    /// Target class.
    pub class_id: ClassId,
}

/// Operator credit-grant payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUpRequest {
    /// Member to credit.
    pub user_id: UserId,
    /// Credits to grant.
    pub amount: u32,
}

/// Wire-friendly error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Expected precondition failure; show to the user, do not retry.
    pub validation: bool,
    /// Caller may retry the same operation.
    pub retryable: bool,
}

impl From<&BookingError> for ErrorResponse {
    fn from(err: &BookingError) -> Self {
        Self {
            error: err.to_string(),
            validation: err.is_validation(),
            retryable: err.is_retryable(),
        }
    }
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Book a class for a member.
pub fn book(
    coordinator: &TransactionCoordinator,
    req: &MemberRequest,
    now: DateTime<Utc>,
) -> Result<BookingReceipt, BookingError> {
    coordinator.book_class(req.user_id, req.class_id, now)
}

/// Cancel a member's booking.
pub fn cancel(
    coordinator: &TransactionCoordinator,
    req: &MemberRequest,
    now: DateTime<Utc>,
) -> Result<CancellationReceipt, BookingError> {
    coordinator.cancel_booking(req.user_id, req.class_id, now)
}

/// Join a full class's waitlist.
pub fn join_waitlist(
    coordinator: &TransactionCoordinator,
    req: &MemberRequest,
    now: DateTime<Utc>,
) -> Result<WaitlistReceipt, BookingError> {
    coordinator.join_waitlist(req.user_id, req.class_id, now)
}

/// Leave a class's waitlist.
pub fn leave_waitlist(
    coordinator: &TransactionCoordinator,
    req: &MemberRequest,
) -> Result<(), BookingError> {
    coordinator.leave_waitlist(req.user_id, req.class_id)
}

/// Operator books a member into a class.
pub fn admin_add(
    coordinator: &TransactionCoordinator,
    operator: &Caller,
    req: &MemberRequest,
) -> Result<BookingReceipt, BookingError> {
    coordinator.admin_add_user(operator, req.class_id, req.user_id)
}

/// Operator removes a member's booking.
pub fn admin_remove(
    coordinator: &TransactionCoordinator,
    operator: &Caller,
    req: &MemberRequest,
) -> Result<CancellationReceipt, BookingError> {
    coordinator.admin_remove_user(operator, req.class_id, req.user_id)
}

/// Operator schedules a new class session.
pub fn create_class(
    coordinator: &TransactionCoordinator,
    operator: &Caller,
    new: NewClass,
) -> Result<ClassSnapshot, BookingError> {
    coordinator.create_class(operator, new)
}

/// Operator deletes a class, refunding its bookings.
pub fn delete_class(
    coordinator: &TransactionCoordinator,
    operator: &Caller,
    class_id: ClassId,
) -> Result<DeleteClassReceipt, BookingError> {
    coordinator.delete_class(operator, class_id)
}

/// Operator grants credits to a member.
pub fn top_up(
    coordinator: &TransactionCoordinator,
    operator: &Caller,
    req: &TopUpRequest,
) -> Result<TopUpReceipt, BookingError> {
    coordinator.admin_top_up(operator, req.user_id, req.amount)
}

/// All scheduled classes ordered by start time.
pub fn list_classes(coordinator: &TransactionCoordinator) -> Vec<ClassSnapshot> {
    let mut classes = coordinator.catalog().snapshot_all();
    classes.sort_by_key(|c| c.starts_at);
    classes
}

/// A member's booked classes ordered by start time.
pub fn list_user_schedule(
    coordinator: &TransactionCoordinator,
    user: UserId,
) -> Vec<ClassSnapshot> {
    let mut classes: Vec<ClassSnapshot> = coordinator
        .reservations()
        .list_by_user(user)
        .into_iter()
        .filter_map(|id| coordinator.catalog().get(id).ok())
        .collect();
    classes.sort_by_key(|c| c.starts_at);
    classes
}

/// Return a health payload.
pub fn health() -> Health {
    Health { ok: true }
}
