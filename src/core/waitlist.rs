//! Per-class FIFO waitlists.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::BookingError;
use crate::util::clock::now_ms;
use crate::util::ids::{ClassId, UserId};

/// One position in a class waitlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistEntry {
    /// Waiting member.
    pub user: UserId,
    /// Join timestamp milliseconds.
    pub joined_at_ms: u128,
    /// Monotonic join sequence; unique across all waitlists.
    pub seq: u64,
}

struct WaitlistState {
    queues: HashMap<ClassId, VecDeque<WaitlistEntry>>,
    next_seq: u64,
}

/// Ordered queues of members waiting for a slot on a full class.
///
/// Strictly FIFO per class: `pop_next` returns the earliest-joined entry.
/// Join order is unique per user so no further tie-break is needed. Cross-
/// component rules (a booked user may not join) are enforced by the
/// transaction coordinator, which is also the only caller of `pop_next`.
pub struct WaitlistManager {
    max_depth: usize,
    inner: Mutex<WaitlistState>,
}

impl WaitlistManager {
    /// Create a manager bounding every class queue at `max_depth` entries.
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            inner: Mutex::new(WaitlistState {
                queues: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Append a user to a class queue and return their 1-based position.
    pub fn join(&self, user: UserId, class: ClassId) -> Result<usize, BookingError> {
        let mut state = self.inner.lock();
        let seq = state.next_seq;
        let queue = state.queues.entry(class).or_default();
        if queue.iter().any(|e| e.user == user) {
            return Err(BookingError::AlreadyWaitlisted);
        }
        if queue.len() >= self.max_depth {
            return Err(BookingError::WaitlistFull);
        }
        queue.push_back(WaitlistEntry {
            user,
            joined_at_ms: now_ms(),
            seq,
        });
        let position = queue.len();
        state.next_seq += 1;
        drop(state);
        tracing::debug!(%user, %class, position, "joined waitlist");
        Ok(position)
    }

    /// Remove a user's entry from a class queue.
    pub fn leave(&self, user: UserId, class: ClassId) -> Result<(), BookingError> {
        let mut state = self.inner.lock();
        let queue = state
            .queues
            .get_mut(&class)
            .ok_or(BookingError::NotWaitlisted)?;
        let before = queue.len();
        queue.retain(|e| e.user != user);
        if queue.len() == before {
            return Err(BookingError::NotWaitlisted);
        }
        if queue.is_empty() {
            state.queues.remove(&class);
        }
        Ok(())
    }

    /// Remove and return the earliest-joined entry, if any.
    ///
    /// The sole mechanism for waitlist promotion; called only by the
    /// transaction coordinator during a cancellation.
    pub fn pop_next(&self, class: ClassId) -> Option<WaitlistEntry> {
        let mut state = self.inner.lock();
        let entry = state.queues.get_mut(&class)?.pop_front();
        if state.queues.get(&class).is_some_and(VecDeque::is_empty) {
            state.queues.remove(&class);
        }
        entry
    }

    /// Put an entry back at the head of its queue.
    ///
    /// Rollback counterpart of `pop_next` for a promotion that could not
    /// commit.
    pub fn push_front(&self, class: ClassId, entry: WaitlistEntry) {
        self.inner
            .lock()
            .queues
            .entry(class)
            .or_default()
            .push_front(entry);
    }

    /// Drop every entry for a class and return them in queue order.
    pub fn clear_class(&self, class: ClassId) -> Vec<WaitlistEntry> {
        self.inner
            .lock()
            .queues
            .remove(&class)
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Replace a class queue with previously cleared entries, in order.
    ///
    /// Rollback counterpart of `clear_class` for a cascade delete that could
    /// not commit.
    pub fn restore_class(&self, class: ClassId, entries: Vec<WaitlistEntry>) {
        if entries.is_empty() {
            return;
        }
        self.inner.lock().queues.insert(class, entries.into());
    }

    /// Whether a user is queued for a class.
    pub fn contains(&self, user: UserId, class: ClassId) -> bool {
        self.inner
            .lock()
            .queues
            .get(&class)
            .is_some_and(|q| q.iter().any(|e| e.user == user))
    }

    /// 1-based queue position of a user, if queued.
    pub fn position(&self, user: UserId, class: ClassId) -> Option<usize> {
        self.inner
            .lock()
            .queues
            .get(&class)?
            .iter()
            .position(|e| e.user == user)
            .map(|i| i + 1)
    }

    /// Number of users queued for a class.
    pub fn len(&self, class: ClassId) -> usize {
        self.inner
            .lock()
            .queues
            .get(&class)
            .map_or(0, VecDeque::len)
    }

    /// Whether the class has an empty queue.
    pub fn is_empty(&self, class: ClassId) -> bool {
        self.len(class) == 0
    }
}
