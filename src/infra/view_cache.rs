//! Month-keyed snapshot cache for calendar rendering.
//!
//! A read-side convenience only: the cache is invalidated by the
//! coordinator's change signal and is never consulted for correctness. It
//! shares no mutable state with the transactional core.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::catalog::ClassSnapshot;
use crate::core::events::{EventKind, EventSink, StudioEvent};

/// Cache of class snapshots bucketed by `YYYY-MM` month key.
pub struct MonthKeyedCache {
    months: Mutex<HashMap<String, Vec<ClassSnapshot>>>,
}

impl MonthKeyedCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            months: Mutex::new(HashMap::new()),
        }
    }

    /// Cached snapshots for a month, if the bucket is warm.
    pub fn get_month(&self, month_key: &str) -> Option<Vec<ClassSnapshot>> {
        self.months.lock().get(month_key).cloned()
    }

    /// Fill a month bucket with freshly loaded snapshots.
    pub fn put_month(&self, month_key: impl Into<String>, rows: Vec<ClassSnapshot>) {
        self.months.lock().insert(month_key.into(), rows);
    }

    /// Drop one month bucket.
    pub fn invalidate_month(&self, month_key: &str) {
        if self.months.lock().remove(month_key).is_some() {
            tracing::debug!(month_key, "view cache bucket invalidated");
        }
    }

    /// Drop every bucket.
    pub fn invalidate_all(&self) {
        self.months.lock().clear();
    }

    /// Number of warm month buckets.
    pub fn len(&self) -> usize {
        self.months.lock().len()
    }

    /// Whether no bucket is warm.
    pub fn is_empty(&self) -> bool {
        self.months.lock().is_empty()
    }

    fn apply(&self, event: &StudioEvent) {
        match event.kind {
            EventKind::ClassChanged | EventKind::ClassDeleted => match &event.month_key {
                Some(key) => self.invalidate_month(key),
                None => self.invalidate_all(),
            },
            EventKind::UserChanged | EventKind::SlotFreed | EventKind::UserPromoted => {}
        }
    }
}

impl Default for MonthKeyedCache {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for Arc<MonthKeyedCache> {
    fn publish(&mut self, event: StudioEvent) {
        self.apply(&event);
    }
}
