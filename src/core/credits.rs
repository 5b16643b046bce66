//! Credit accounts: cached balances backed by an append-only ledger.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::util::clock::now_ms;
use crate::util::ids::UserId;

/// Why a credit adjustment was made; recorded on every ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    /// Member booked a class.
    Booking,
    /// Member cancelled a booking.
    Cancellation,
    /// Operator booked a member, or a waitlisted member was promoted.
    AdminBooking,
    /// Operator removed a member from a class.
    AdminRefund,
    /// Operator granted credits directly.
    AdminTopUp,
    /// Class was deleted and active bookings were refunded.
    ClassCancelledRefund,
}

/// One append-only audit record of a credit adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Account the adjustment applies to.
    pub user: UserId,
    /// Signed credit delta.
    pub delta: i64,
    /// Business reason for the adjustment.
    pub reason: LedgerReason,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

struct CreditState {
    balances: HashMap<UserId, i64>,
    ledger: Vec<LedgerEntry>,
}

/// Per-user credit balances with a shared append-only ledger.
///
/// Balances may go negative; that is a deficit the business tolerates.
/// Every adjustment appends a ledger entry before the cached balance is
/// updated, and the two happen under one lock so the invariant
/// `balance == sum of ledger deltas` holds at every observable point.
pub struct CreditAccounts {
    inner: Mutex<CreditState>,
}

impl CreditAccounts {
    /// Create an empty set of accounts.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CreditState {
                balances: HashMap::new(),
                ledger: Vec::new(),
            }),
        }
    }

    /// Current balance for a user; an account with no history reads as 0.
    pub fn balance(&self, user: UserId) -> i64 {
        self.inner.lock().balances.get(&user).copied().unwrap_or(0)
    }

    /// Apply a signed adjustment and return the new balance.
    ///
    /// Deliberately not idempotent: each call always applies. The transaction
    /// coordinator's atomicity guarantee is what ensures exactly one call per
    /// logical event.
    pub fn adjust(&self, user: UserId, delta: i64, reason: LedgerReason) -> i64 {
        let mut state = self.inner.lock();
        state.ledger.push(LedgerEntry {
            user,
            delta,
            reason,
            created_at_ms: now_ms(),
        });
        let balance = state.balances.entry(user).or_insert(0);
        *balance += delta;
        let balance = *balance;
        drop(state);
        tracing::debug!(%user, delta, ?reason, balance, "credit adjusted");
        balance
    }

    /// Ledger entries for one user, oldest first.
    pub fn ledger_for(&self, user: UserId) -> Vec<LedgerEntry> {
        self.inner
            .lock()
            .ledger
            .iter()
            .filter(|e| e.user == user)
            .cloned()
            .collect()
    }

    /// Sum of a user's ledger deltas; equals `balance` unless the ledger
    /// invariant has been breached.
    pub fn ledger_sum(&self, user: UserId) -> i64 {
        self.inner
            .lock()
            .ledger
            .iter()
            .filter(|e| e.user == user)
            .map(|e| e.delta)
            .sum()
    }

    /// Total number of ledger entries across all users.
    pub fn ledger_len(&self) -> usize {
        self.inner.lock().ledger.len()
    }

    /// Snapshot of every cached balance, unordered.
    pub fn balances(&self) -> Vec<(UserId, i64)> {
        self.inner
            .lock()
            .balances
            .iter()
            .map(|(user, balance)| (*user, *balance))
            .collect()
    }
}

impl Default for CreditAccounts {
    fn default() -> Self {
        Self::new()
    }
}
