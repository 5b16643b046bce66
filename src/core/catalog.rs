//! Class catalog: session records and CAS-guarded occupancy accounting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::BookingError;
use crate::util::ids::ClassId;

/// Fields supplied when scheduling a new class session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClass {
    /// Display name of the class.
    pub name: String,
    /// Optional long-form description.
    pub description: Option<String>,
    /// Optional trainer name.
    pub trainer: Option<String>,
    /// Scheduled start of the session.
    pub starts_at: DateTime<Utc>,
    /// Number of bookable slots; must be positive.
    pub capacity: u32,
}

/// Immutable-by-members class session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSession {
    /// Session identifier.
    pub id: ClassId,
    /// Display name of the class.
    pub name: String,
    /// Optional long-form description.
    pub description: Option<String>,
    /// Optional trainer name.
    pub trainer: Option<String>,
    /// Scheduled start of the session.
    pub starts_at: DateTime<Utc>,
    /// Number of bookable slots.
    pub capacity: u32,
}

impl ClassSession {
    /// Month bucket key (`YYYY-MM`) used by read-side caches.
    pub fn month_key(&self) -> String {
        self.starts_at.format("%Y-%m").to_string()
    }
}

/// Point-in-time view of a session including its occupancy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSnapshot {
    /// Session identifier.
    pub id: ClassId,
    /// Display name of the class.
    pub name: String,
    /// Optional long-form description.
    pub description: Option<String>,
    /// Optional trainer name.
    pub trainer: Option<String>,
    /// Scheduled start of the session.
    pub starts_at: DateTime<Utc>,
    /// Number of bookable slots.
    pub capacity: u32,
    /// Slots currently claimed.
    pub occupancy: u32,
}

impl ClassSnapshot {
    /// Month bucket key (`YYYY-MM`) used by read-side caches.
    pub fn month_key(&self) -> String {
        self.starts_at.format("%Y-%m").to_string()
    }
}

struct ClassEntry {
    session: ClassSession,
    occupancy: AtomicU32,
}

impl ClassEntry {
    fn snapshot(&self) -> ClassSnapshot {
        ClassSnapshot {
            id: self.session.id,
            name: self.session.name.clone(),
            description: self.session.description.clone(),
            trainer: self.session.trainer.clone(),
            starts_at: self.session.starts_at,
            capacity: self.session.capacity,
            occupancy: self.occupancy.load(Ordering::Acquire),
        }
    }
}

/// Catalog of scheduled class sessions.
///
/// Occupancy lives in a per-class `AtomicU32` adjusted through a CAS loop;
/// `adjust_occupancy` is the single choke point for the capacity invariant.
/// Session records themselves are immutable once inserted.
pub struct ClassCatalog {
    classes: RwLock<HashMap<ClassId, Arc<ClassEntry>>>,
}

impl ClassCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            classes: RwLock::new(HashMap::new()),
        }
    }

    /// Schedule a new session with zero occupancy and return its identifier.
    pub fn create(&self, new: NewClass) -> Result<ClassId, BookingError> {
        if new.capacity == 0 {
            return Err(BookingError::InvalidConfig(
                "class capacity must be greater than 0".into(),
            ));
        }
        let id = ClassId::new();
        let session = ClassSession {
            id,
            name: new.name,
            description: new.description,
            trainer: new.trainer,
            starts_at: new.starts_at,
            capacity: new.capacity,
        };
        let entry = Arc::new(ClassEntry {
            session,
            occupancy: AtomicU32::new(0),
        });
        self.classes.write().insert(id, entry);
        tracing::info!(%id, "class scheduled");
        Ok(id)
    }

    /// Fetch a snapshot of a session.
    pub fn get(&self, id: ClassId) -> Result<ClassSnapshot, BookingError> {
        self.classes
            .read()
            .get(&id)
            .map(|e| e.snapshot())
            .ok_or(BookingError::ClassNotFound(id))
    }

    /// Whether a session with this identifier exists.
    pub fn contains(&self, id: ClassId) -> bool {
        self.classes.read().contains_key(&id)
    }

    /// Adjust a session's occupancy by `delta` and return the new value.
    ///
    /// Uses a CAS loop on the occupancy counter. Fails with
    /// `CapacityExceeded` if the result would exceed capacity or fall below
    /// zero; all booking and cancellation paths route through here rather
    /// than recomputing occupancy independently.
    pub fn adjust_occupancy(&self, id: ClassId, delta: i32) -> Result<u32, BookingError> {
        let entry = {
            let classes = self.classes.read();
            classes
                .get(&id)
                .cloned()
                .ok_or(BookingError::ClassNotFound(id))?
        };
        let capacity = entry.session.capacity;
        let mut current = entry.occupancy.load(Ordering::Acquire);
        loop {
            let next = if delta >= 0 {
                let step = delta.unsigned_abs();
                let next = current.saturating_add(step);
                if next > capacity {
                    return Err(BookingError::CapacityExceeded(format!(
                        "class {id}: occupancy {current} + {step} exceeds capacity {capacity}"
                    )));
                }
                next
            } else {
                let step = delta.unsigned_abs();
                if current < step {
                    return Err(BookingError::CapacityExceeded(format!(
                        "class {id}: occupancy {current} - {step} falls below zero"
                    )));
                }
                current - step
            };
            match entry.occupancy.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    tracing::debug!(%id, occupancy = next, "occupancy adjusted");
                    return Ok(next);
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Remove a session and return its record.
    ///
    /// Called only after dependent reservations and waitlist entries have
    /// been cleared by the transaction coordinator.
    pub fn remove(&self, id: ClassId) -> Result<ClassSession, BookingError> {
        self.classes
            .write()
            .remove(&id)
            .map(|e| e.session.clone())
            .ok_or(BookingError::ClassNotFound(id))
    }

    /// Number of sessions in the catalog.
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Whether the catalog holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    /// Snapshots of every session, unordered.
    pub fn snapshot_all(&self) -> Vec<ClassSnapshot> {
        self.classes.read().values().map(|e| e.snapshot()).collect()
    }

    /// Snapshots of the sessions in a given `YYYY-MM` month bucket.
    pub fn snapshot_month(&self, month_key: &str) -> Vec<ClassSnapshot> {
        self.classes
            .read()
            .values()
            .filter(|e| e.session.month_key() == month_key)
            .map(|e| e.snapshot())
            .collect()
    }
}

impl Default for ClassCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_class(capacity: u32) -> NewClass {
        NewClass {
            name: "Yoga".into(),
            description: None,
            trainer: Some("Dana".into()),
            starts_at: Utc.with_ymd_and_hms(2026, 9, 14, 18, 0, 0).unwrap(),
            capacity,
        }
    }

    #[test]
    fn test_create_and_get() {
        let catalog = ClassCatalog::new();
        let id = catalog.create(make_class(5)).unwrap();
        let snap = catalog.get(id).unwrap();
        assert_eq!(snap.capacity, 5);
        assert_eq!(snap.occupancy, 0);
        assert_eq!(snap.month_key(), "2026-09");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let catalog = ClassCatalog::new();
        assert!(matches!(
            catalog.create(make_class(0)),
            Err(BookingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_adjust_occupancy_bounds() {
        let catalog = ClassCatalog::new();
        let id = catalog.create(make_class(2)).unwrap();

        assert_eq!(catalog.adjust_occupancy(id, 1).unwrap(), 1);
        assert_eq!(catalog.adjust_occupancy(id, 1).unwrap(), 2);
        assert!(matches!(
            catalog.adjust_occupancy(id, 1),
            Err(BookingError::CapacityExceeded(_))
        ));

        assert_eq!(catalog.adjust_occupancy(id, -2).unwrap(), 0);
        assert!(matches!(
            catalog.adjust_occupancy(id, -1),
            Err(BookingError::CapacityExceeded(_))
        ));
    }

    #[test]
    fn test_adjust_unknown_class() {
        let catalog = ClassCatalog::new();
        assert!(matches!(
            catalog.adjust_occupancy(ClassId::new(), 1),
            Err(BookingError::ClassNotFound(_))
        ));
    }

    #[test]
    fn test_remove() {
        let catalog = ClassCatalog::new();
        let id = catalog.create(make_class(3)).unwrap();
        assert_eq!(catalog.len(), 1);
        let session = catalog.remove(id).unwrap();
        assert_eq!(session.id, id);
        assert!(catalog.is_empty());
        assert!(matches!(
            catalog.get(id),
            Err(BookingError::ClassNotFound(_))
        ));
    }

    #[test]
    fn test_snapshot_month() {
        let catalog = ClassCatalog::new();
        catalog.create(make_class(3)).unwrap();
        let mut other = make_class(3);
        other.starts_at = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();
        catalog.create(other).unwrap();

        assert_eq!(catalog.snapshot_month("2026-09").len(), 1);
        assert_eq!(catalog.snapshot_month("2026-10").len(), 1);
        assert!(catalog.snapshot_month("2026-11").is_empty());
    }
}
