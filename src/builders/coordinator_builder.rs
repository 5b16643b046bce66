//! Construct a transaction coordinator from validated configuration.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::StudioConfig;
use crate::core::{
    BookingError, ClassCatalog, CreditAccounts, EventSink, ReservationLedger,
    TransactionCoordinator, WaitlistManager,
};

/// Build a coordinator with fresh ledgers and the given event sinks.
///
/// Sinks are shared handles so callers can keep one side (e.g. a view cache)
/// and hand the other to the coordinator.
pub fn build_coordinator(
    cfg: &StudioConfig,
    sinks: impl IntoIterator<Item = Arc<Mutex<Box<dyn EventSink>>>>,
) -> Result<TransactionCoordinator, BookingError> {
    cfg.validate()
        .map_err(|e| BookingError::InvalidConfig(format!("config invalid: {e}")))?;

    let catalog = Arc::new(ClassCatalog::new());
    let credits = Arc::new(CreditAccounts::new());
    let reservations = Arc::new(ReservationLedger::new());
    let waitlist = Arc::new(WaitlistManager::new(cfg.coordinator.max_waitlist_depth));

    let mut coordinator = TransactionCoordinator::new(
        cfg.coordinator.limits(),
        catalog,
        credits,
        reservations,
        waitlist,
    );
    for sink in sinks {
        coordinator = coordinator.with_event_sink(sink);
    }
    Ok(coordinator)
}
