//! Committed-change events and sink implementations.
//!
//! Every committed transaction publishes events so read-side caches can
//! invalidate and notification workers can message affected members. Sinks
//! are informed outside the transaction's critical section and never
//! participate in correctness.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::util::clock::now_ms;
use crate::util::ids::{ClassId, UserId};

/// What changed in a committed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A class's bookings or waitlist changed.
    ClassChanged,
    /// A class was deleted.
    ClassDeleted,
    /// A user's bookings or balance changed.
    UserChanged,
    /// A cancellation freed a slot and no one was promoted into it.
    SlotFreed,
    /// A waitlisted user was promoted into a freed slot.
    UserPromoted,
}

/// One committed-change event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioEvent {
    /// Kind of change.
    pub kind: EventKind,
    /// Affected class, if any.
    pub class_id: Option<ClassId>,
    /// Affected user, if any.
    pub user_id: Option<UserId>,
    /// `YYYY-MM` bucket of the affected class, for month-keyed caches.
    pub month_key: Option<String>,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Event sink abstraction.
pub trait EventSink: Send {
    /// Receive one committed-change event.
    fn publish(&mut self, event: StudioEvent);
}

/// In-memory event sink for testing and dev.
///
/// Shareable: keep an `Arc` handle to read events back after registering a
/// clone with the coordinator.
pub struct InMemoryEventSink {
    events: Mutex<VecDeque<StudioEvent>>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<StudioEvent> {
        self.events.lock().iter().cloned().collect()
    }

    fn record(&self, event: StudioEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

impl EventSink for InMemoryEventSink {
    fn publish(&mut self, event: StudioEvent) {
        self.record(event);
    }
}

impl EventSink for Arc<InMemoryEventSink> {
    fn publish(&mut self, event: StudioEvent) {
        self.record(event);
    }
}

/// Helper to build an event stamped with the current time.
pub fn build_event(
    kind: EventKind,
    class_id: Option<ClassId>,
    user_id: Option<UserId>,
    month_key: Option<String>,
) -> StudioEvent {
    StudioEvent {
        kind,
        class_id,
        user_id,
        month_key,
        created_at_ms: now_ms(),
    }
}
