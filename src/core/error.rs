//! Error types for booking operations.

use thiserror::Error;

use crate::util::ids::ClassId;

/// Errors produced by the booking core.
///
/// Validation errors are expected and returned to the caller for user-facing
/// messaging. `TransactionConflict` is a retry signal. `CapacityExceeded`
/// marks an invariant breach inside the transaction boundary and is never
/// recovered silently.
#[derive(Debug, Error)]
pub enum BookingError {
    /// Class session does not exist.
    #[error("class not found: {0}")]
    ClassNotFound(ClassId),
    /// User already holds a reservation for this class.
    #[error("already booked")]
    AlreadyBooked,
    /// User already holds a waitlist entry for this class.
    #[error("already waitlisted")]
    AlreadyWaitlisted,
    /// User holds no reservation for this class.
    #[error("not booked")]
    NotBooked,
    /// User holds no waitlist entry for this class.
    #[error("not waitlisted")]
    NotWaitlisted,
    /// Every slot on the class is claimed; join the waitlist instead.
    #[error("class full")]
    ClassFull,
    /// The class still has open slots; book directly instead of waitlisting.
    #[error("class has open slots")]
    SlotsAvailable,
    /// The waitlist for this class is at its configured depth bound.
    #[error("waitlist full")]
    WaitlistFull,
    /// The class has already started.
    #[error("class already started")]
    ClassStarted,
    /// Caller lacks the operator role required for this operation.
    #[error("operator role required")]
    Forbidden,
    /// An identical request for this (user, class, operation) is in flight.
    #[error("request already in flight")]
    RequestInFlight,
    /// Transactions on this class are contended; retry after backoff.
    #[error("transaction conflict: {0}")]
    TransactionConflict(String),
    /// Occupancy or ledger invariant breached; indicates a bug in the
    /// transaction boundary.
    #[error("capacity invariant violated: {0}")]
    CapacityExceeded(String),
    /// Configuration rejected during construction.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BookingError {
    /// True for expected precondition failures that callers surface to the
    /// user without retrying.
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ClassNotFound(_)
                | Self::AlreadyBooked
                | Self::AlreadyWaitlisted
                | Self::NotBooked
                | Self::NotWaitlisted
                | Self::ClassFull
                | Self::SlotsAvailable
                | Self::WaitlistFull
                | Self::ClassStarted
                | Self::Forbidden
                | Self::RequestInFlight
        )
    }

    /// True when the caller may retry the same operation.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionConflict(_))
    }

    /// True for invariant breaches that must be escalated, never absorbed.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::CapacityExceeded(_))
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
