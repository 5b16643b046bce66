//! Transactional booking core and its four ledgers.

pub mod catalog;
pub mod coordinator;
pub mod credits;
pub mod error;
pub mod events;
pub mod reservations;
pub mod waitlist;

pub use catalog::{ClassCatalog, ClassSession, ClassSnapshot, NewClass};
pub use coordinator::{
    BookingReceipt, Caller, CancellationReceipt, CoordinatorLimits, DeleteClassReceipt, OpKind,
    Role, TopUpReceipt, TransactionCoordinator, WaitlistReceipt,
};
pub use credits::{CreditAccounts, LedgerEntry, LedgerReason};
pub use error::{AppResult, BookingError};
pub use events::{build_event, EventKind, EventSink, InMemoryEventSink, StudioEvent};
pub use reservations::ReservationLedger;
pub use waitlist::{WaitlistEntry, WaitlistManager};
