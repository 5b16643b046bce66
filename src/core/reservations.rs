//! Reservation ledger: the set of active (user, class) bookings.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::core::BookingError;
use crate::util::ids::{ClassId, UserId};

struct ReservationState {
    by_class: HashMap<ClassId, HashSet<UserId>>,
    by_user: HashMap<UserId, HashSet<ClassId>>,
}

/// Pure bookkeeping of active bookings, indexed both ways.
///
/// Carries no business rule beyond uniqueness of the (user, class) pair;
/// capacity and credit rules live in the transaction coordinator.
pub struct ReservationLedger {
    inner: Mutex<ReservationState>,
}

impl ReservationLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ReservationState {
                by_class: HashMap::new(),
                by_user: HashMap::new(),
            }),
        }
    }

    /// Record a booking.
    pub fn create(&self, user: UserId, class: ClassId) -> Result<(), BookingError> {
        let mut state = self.inner.lock();
        if !state.by_class.entry(class).or_default().insert(user) {
            return Err(BookingError::AlreadyBooked);
        }
        state.by_user.entry(user).or_default().insert(class);
        Ok(())
    }

    /// Remove a booking.
    pub fn remove(&self, user: UserId, class: ClassId) -> Result<(), BookingError> {
        let mut state = self.inner.lock();
        let removed = state
            .by_class
            .get_mut(&class)
            .is_some_and(|users| users.remove(&user));
        if !removed {
            return Err(BookingError::NotBooked);
        }
        if state.by_class.get(&class).is_some_and(HashSet::is_empty) {
            state.by_class.remove(&class);
        }
        if let Some(classes) = state.by_user.get_mut(&user) {
            classes.remove(&class);
            if classes.is_empty() {
                state.by_user.remove(&user);
            }
        }
        Ok(())
    }

    /// Whether the user holds an active booking for the class.
    pub fn contains(&self, user: UserId, class: ClassId) -> bool {
        self.inner
            .lock()
            .by_class
            .get(&class)
            .is_some_and(|users| users.contains(&user))
    }

    /// Classes the user currently holds bookings for, unordered.
    pub fn list_by_user(&self, user: UserId) -> Vec<ClassId> {
        self.inner
            .lock()
            .by_user
            .get(&user)
            .map(|classes| classes.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Users currently booked on the class, unordered.
    pub fn list_by_class(&self, class: ClassId) -> Vec<UserId> {
        self.inner
            .lock()
            .by_class
            .get(&class)
            .map(|users| users.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of active bookings on the class.
    pub fn count_for_class(&self, class: ClassId) -> usize {
        self.inner
            .lock()
            .by_class
            .get(&class)
            .map_or(0, HashSet::len)
    }

    /// Remove every booking on the class and return the affected users.
    pub fn clear_class(&self, class: ClassId) -> Vec<UserId> {
        let mut state = self.inner.lock();
        let users: Vec<UserId> = state
            .by_class
            .remove(&class)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for user in &users {
            if let Some(classes) = state.by_user.get_mut(user) {
                classes.remove(&class);
                if classes.is_empty() {
                    state.by_user.remove(user);
                }
            }
        }
        users
    }

    /// Total number of active bookings.
    pub fn total(&self) -> usize {
        self.inner.lock().by_class.values().map(HashSet::len).sum()
    }
}

impl Default for ReservationLedger {
    fn default() -> Self {
        Self::new()
    }
}
