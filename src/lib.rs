//! # Studio Reservations
//!
//! A transactional booking core for finite-capacity scheduled class
//! sessions: booking, cancellation, waitlisting, waitlist promotion, and the
//! per-user credit balance that prices each booking.
//!
//! This library is the one subsystem of a studio platform that must satisfy
//! real invariants under concurrent access. Everything else (rendering,
//! calendars, exports, authentication) is treated as an external
//! collaborator calling into this core.
//!
//! ## Core Guarantees
//!
//! - **Capacity**: a class's occupancy never exceeds its capacity and always
//!   equals its count of active reservations
//! - **Ledger consistency**: a credit is never debited without a reservation
//!   existing, and every balance equals the sum of its append-only ledger
//! - **Atomicity**: each operation commits all of its ledger mutations or
//!   none of them; partial state is never observable
//! - **Deterministic promotion**: a cancellation frees a slot and promotes
//!   the earliest waitlisted member inside the same transaction
//!
//! ## Concurrency Model
//!
//! There is no global lock. Each transaction is scoped to one class: a
//! per-class mutex serializes same-class writers while different classes
//! proceed fully in parallel, and occupancy itself is adjusted through a CAS
//! loop so a capacity breach is caught even off the coordinated path. Lock
//! acquisition is bounded and surfaces `TransactionConflict` rather than
//! blocking indefinitely, and an in-flight set rejects duplicate rapid-fire
//! calls for the same (user, class, operation).
//!
//! ## Example
//!
//! ```rust,ignore
//! use chrono::Utc;
//! use studio_reservations::builders::build_coordinator;
//! use studio_reservations::config::StudioConfig;
//! use studio_reservations::core::{Caller, NewClass};
//! use studio_reservations::util::ids::UserId;
//!
//! let coordinator = build_coordinator(&StudioConfig::default(), [])?;
//! let operator = Caller::operator(UserId::new());
//! let class = coordinator.create_class(&operator, NewClass {
//!     name: "Spin".into(),
//!     description: None,
//!     trainer: Some("Dana".into()),
//!     starts_at: Utc::now() + chrono::Duration::days(1),
//!     capacity: 12,
//! })?;
//!
//! let member = UserId::new();
//! let receipt = coordinator.book_class(member, class.id, Utc::now())?;
//! assert_eq!(receipt.occupancy, 1);
//! ```
//!
//! For complete examples, see:
//! - `tests/booking_lifecycle_test.rs` - Full integration tests
//! - `tests/concurrency_test.rs` - Contended booking scenarios

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Transactional booking core and its four ledgers.
pub mod core;
/// Configuration models for the booking core.
pub mod config;
/// Builders to construct the booking core from configuration.
pub mod builders;
/// Read-side adapters fed by the coordinator's change signal.
pub mod infra;
/// External API surface and runtime adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;
