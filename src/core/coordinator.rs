//! Transaction coordinator: atomic multi-ledger booking operations.
//!
//! Every member- or operator-initiated action executes as one all-or-nothing
//! unit against the class catalog, credit accounts, reservation ledger, and
//! waitlist. Transactions are scoped to a single class: a per-class lock
//! serializes writers on the same class while classes proceed independently.
//! Waitlist promotion happens inside the cancellation's critical section so
//! a freed slot is never visible unclaimed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::catalog::{ClassCatalog, ClassSnapshot, NewClass};
use crate::core::credits::{CreditAccounts, LedgerReason};
use crate::core::events::{build_event, EventKind, EventSink, StudioEvent};
use crate::core::reservations::ReservationLedger;
use crate::core::waitlist::WaitlistManager;
use crate::core::BookingError;
use crate::util::ids::{ClassId, UserId};

/// Tunable limits for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorLimits {
    /// Credits debited per booking and refunded per cancellation.
    pub booking_cost: i64,
    /// Lock-acquisition attempts before surfacing `TransactionConflict`.
    pub max_txn_attempts: u32,
    /// How long each attempt waits on a contended class lock.
    pub lock_timeout: Duration,
}

/// Operation kinds tracked by the in-flight duplicate guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    /// Member booking.
    Book,
    /// Member cancellation.
    Cancel,
    /// Member joining a waitlist.
    JoinWaitlist,
    /// Member leaving a waitlist.
    LeaveWaitlist,
    /// Operator booking on behalf of a member.
    AdminAdd,
    /// Operator removing a member's booking.
    AdminRemove,
    /// Operator deleting a class.
    DeleteClass,
}

/// Role attached to an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular studio member.
    Member,
    /// Studio operator with admin capabilities.
    Operator,
}

/// Authenticated caller context supplied by the external identity provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Caller {
    /// Verified user identifier.
    pub user: UserId,
    /// Role granted to the caller.
    pub role: Role,
}

impl Caller {
    /// Member-role caller.
    pub const fn member(user: UserId) -> Self {
        Self {
            user,
            role: Role::Member,
        }
    }

    /// Operator-role caller.
    pub const fn operator(user: UserId) -> Self {
        Self {
            user,
            role: Role::Operator,
        }
    }
}

/// Success payload of a committed booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingReceipt {
    /// Booked class.
    pub class_id: ClassId,
    /// Booked member.
    pub user_id: UserId,
    /// Class occupancy after the booking.
    pub occupancy: u32,
    /// Member balance after the debit.
    pub balance: i64,
}

/// Success payload of a committed cancellation or admin removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationReceipt {
    /// Affected class.
    pub class_id: ClassId,
    /// Member whose booking was removed.
    pub user_id: UserId,
    /// Class occupancy after the transaction, promotion included.
    pub occupancy: u32,
    /// Removed member's balance after the refund.
    pub balance: i64,
    /// Waitlisted member promoted into the freed slot, if any.
    pub promoted: Option<UserId>,
}

/// Success payload of a waitlist join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistReceipt {
    /// Class waited on.
    pub class_id: ClassId,
    /// Waiting member.
    pub user_id: UserId,
    /// 1-based queue position.
    pub position: usize,
}

/// Success payload of a cascading class deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteClassReceipt {
    /// Deleted class.
    pub class_id: ClassId,
    /// Members whose bookings were refunded.
    pub refunded: Vec<UserId>,
    /// Number of waitlist entries dropped without refund.
    pub waitlist_cleared: usize,
}

/// Success payload of an operator credit grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUpReceipt {
    /// Credited member.
    pub user_id: UserId,
    /// Balance after the grant.
    pub balance: i64,
}

type InFlightKey = (UserId, ClassId, OpKind);

/// Releases the in-flight entry when the operation finishes.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<InFlightKey>>>,
    key: InFlightKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.key);
    }
}

/// Coordinates atomic transactions across the four ledgers.
pub struct TransactionCoordinator {
    limits: CoordinatorLimits,
    catalog: Arc<ClassCatalog>,
    credits: Arc<CreditAccounts>,
    reservations: Arc<ReservationLedger>,
    waitlist: Arc<WaitlistManager>,
    class_locks: Mutex<HashMap<ClassId, Arc<Mutex<()>>>>,
    in_flight: Arc<Mutex<HashSet<InFlightKey>>>,
    sinks: Vec<Arc<Mutex<Box<dyn EventSink>>>>,
}

impl TransactionCoordinator {
    /// Create a coordinator over the given ledgers.
    pub fn new(
        limits: CoordinatorLimits,
        catalog: Arc<ClassCatalog>,
        credits: Arc<CreditAccounts>,
        reservations: Arc<ReservationLedger>,
        waitlist: Arc<WaitlistManager>,
    ) -> Self {
        Self {
            limits,
            catalog,
            credits,
            reservations,
            waitlist,
            class_locks: Mutex::new(HashMap::new()),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            sinks: Vec::new(),
        }
    }

    /// Attach an event sink informed after every committed transaction.
    pub fn with_event_sink(mut self, sink: Arc<Mutex<Box<dyn EventSink>>>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Class catalog read access.
    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    /// Credit accounts read access.
    pub fn credits(&self) -> &CreditAccounts {
        &self.credits
    }

    /// Reservation ledger read access.
    pub fn reservations(&self) -> &ReservationLedger {
        &self.reservations
    }

    /// Waitlist read access.
    pub fn waitlist(&self) -> &WaitlistManager {
        &self.waitlist
    }

    /// Book a class for a member.
    ///
    /// Claims a slot, records the reservation, and debits one booking's cost,
    /// all atomically. A stale waitlist entry for the same pair is removed in
    /// the same transaction. Fails `ClassFull` when no slot is open and
    /// `ClassStarted` for sessions already underway.
    pub fn book_class(
        &self,
        user: UserId,
        class: ClassId,
        now: DateTime<Utc>,
    ) -> Result<BookingReceipt, BookingError> {
        let _guard = self.begin_in_flight(user, class, OpKind::Book)?;
        let (receipt, month) = self.with_class_txn(class, || {
            self.create_booking(user, class, Some(now), LedgerReason::Booking)
        })?;
        tracing::info!(%user, %class, occupancy = receipt.occupancy, "booking committed");
        self.publish(vec![
            build_event(EventKind::ClassChanged, Some(class), None, Some(month)),
            build_event(EventKind::UserChanged, None, Some(user), None),
        ]);
        Ok(receipt)
    }

    /// Cancel a member's booking, promoting the earliest waitlisted member
    /// into the freed slot within the same transaction.
    ///
    /// When a promotion occurs the net occupancy change is zero; an empty
    /// waitlist simply leaves the slot open.
    pub fn cancel_booking(
        &self,
        user: UserId,
        class: ClassId,
        now: DateTime<Utc>,
    ) -> Result<CancellationReceipt, BookingError> {
        let _guard = self.begin_in_flight(user, class, OpKind::Cancel)?;
        let (receipt, month) = self.with_class_txn(class, || {
            self.remove_booking(user, class, Some(now), LedgerReason::Cancellation)
        })?;
        tracing::info!(
            %user,
            %class,
            promoted = ?receipt.promoted,
            occupancy = receipt.occupancy,
            "cancellation committed"
        );
        self.publish(self.cancellation_events(&receipt, month));
        Ok(receipt)
    }

    /// Operator books a member into a class.
    ///
    /// Same ledger effects as `book_class` with reason `AdminBooking`, and no
    /// past-class guard: operators may correct attendance after the fact.
    pub fn admin_add_user(
        &self,
        operator: &Caller,
        class: ClassId,
        user: UserId,
    ) -> Result<BookingReceipt, BookingError> {
        self.authorize(operator)?;
        let _guard = self.begin_in_flight(user, class, OpKind::AdminAdd)?;
        let (receipt, month) = self.with_class_txn(class, || {
            self.create_booking(user, class, None, LedgerReason::AdminBooking)
        })?;
        tracing::info!(operator = %operator.user, %user, %class, "admin booking committed");
        self.publish(vec![
            build_event(EventKind::ClassChanged, Some(class), None, Some(month)),
            build_event(EventKind::UserChanged, None, Some(user), None),
        ]);
        Ok(receipt)
    }

    /// Operator removes a member's booking, with the same promotion
    /// behavior as `cancel_booking` and reason `AdminRefund`.
    pub fn admin_remove_user(
        &self,
        operator: &Caller,
        class: ClassId,
        user: UserId,
    ) -> Result<CancellationReceipt, BookingError> {
        self.authorize(operator)?;
        let _guard = self.begin_in_flight(user, class, OpKind::AdminRemove)?;
        let (receipt, month) = self.with_class_txn(class, || {
            self.remove_booking(user, class, None, LedgerReason::AdminRefund)
        })?;
        tracing::info!(operator = %operator.user, %user, %class, "admin removal committed");
        self.publish(self.cancellation_events(&receipt, month));
        Ok(receipt)
    }

    /// Operator schedules a new class session.
    pub fn create_class(
        &self,
        operator: &Caller,
        new: NewClass,
    ) -> Result<ClassSnapshot, BookingError> {
        self.authorize(operator)?;
        let id = self.catalog.create(new)?;
        let snapshot = self.catalog.get(id)?;
        self.publish(vec![build_event(
            EventKind::ClassChanged,
            Some(id),
            None,
            Some(snapshot.month_key()),
        )]);
        Ok(snapshot)
    }

    /// Operator deletes a class, refunding every active booking and dropping
    /// the waitlist (waitlisted members were never charged).
    ///
    /// One transaction: a failure partway leaves the class, its reservations,
    /// and its waitlist exactly as they were.
    pub fn delete_class(
        &self,
        operator: &Caller,
        class: ClassId,
    ) -> Result<DeleteClassReceipt, BookingError> {
        self.authorize(operator)?;
        let _guard = self.begin_in_flight(operator.user, class, OpKind::DeleteClass)?;
        let (receipt, month) = self.with_class_txn(class, || {
            let snapshot = self.catalog.get(class)?;
            let refunded = self.reservations.clear_class(class);
            let cleared = self.waitlist.clear_class(class);
            if let Err(err) = self.catalog.remove(class) {
                for user in &refunded {
                    let _ = self.reservations.create(*user, class);
                }
                self.waitlist.restore_class(class, cleared);
                return Err(self.escalate(err, "delete class"));
            }
            for user in &refunded {
                self.credits
                    .adjust(*user, self.limits.booking_cost, LedgerReason::ClassCancelledRefund);
            }
            let receipt = DeleteClassReceipt {
                class_id: class,
                refunded,
                waitlist_cleared: cleared.len(),
            };
            Ok((receipt, snapshot.month_key()))
        })?;
        self.class_locks.lock().remove(&class);
        tracing::info!(
            operator = %operator.user,
            %class,
            refunded = receipt.refunded.len(),
            waitlist_cleared = receipt.waitlist_cleared,
            "class deleted"
        );
        let mut events = vec![build_event(
            EventKind::ClassDeleted,
            Some(class),
            None,
            Some(month),
        )];
        for user in &receipt.refunded {
            events.push(build_event(EventKind::UserChanged, None, Some(*user), None));
        }
        self.publish(events);
        Ok(receipt)
    }

    /// Join the waitlist of a full class.
    ///
    /// Fails `SlotsAvailable` while the class still has open capacity: the
    /// caller should book directly instead.
    pub fn join_waitlist(
        &self,
        user: UserId,
        class: ClassId,
        now: DateTime<Utc>,
    ) -> Result<WaitlistReceipt, BookingError> {
        let _guard = self.begin_in_flight(user, class, OpKind::JoinWaitlist)?;
        let (receipt, month) = self.with_class_txn(class, || {
            let snapshot = self.catalog.get(class)?;
            if snapshot.starts_at <= now {
                return Err(BookingError::ClassStarted);
            }
            if self.reservations.contains(user, class) {
                return Err(BookingError::AlreadyBooked);
            }
            if snapshot.occupancy < snapshot.capacity {
                return Err(BookingError::SlotsAvailable);
            }
            let position = self.waitlist.join(user, class)?;
            let receipt = WaitlistReceipt {
                class_id: class,
                user_id: user,
                position,
            };
            Ok((receipt, snapshot.month_key()))
        })?;
        tracing::info!(%user, %class, position = receipt.position, "joined waitlist");
        self.publish(vec![
            build_event(EventKind::ClassChanged, Some(class), None, Some(month)),
            build_event(EventKind::UserChanged, None, Some(user), None),
        ]);
        Ok(receipt)
    }

    /// Leave a class waitlist.
    pub fn leave_waitlist(&self, user: UserId, class: ClassId) -> Result<(), BookingError> {
        let _guard = self.begin_in_flight(user, class, OpKind::LeaveWaitlist)?;
        let month = self.with_class_txn(class, || {
            let snapshot = self.catalog.get(class)?;
            self.waitlist.leave(user, class)?;
            Ok(snapshot.month_key())
        })?;
        tracing::info!(%user, %class, "left waitlist");
        self.publish(vec![
            build_event(EventKind::ClassChanged, Some(class), None, Some(month)),
            build_event(EventKind::UserChanged, None, Some(user), None),
        ]);
        Ok(())
    }

    /// Operator grants credits to a member.
    pub fn admin_top_up(
        &self,
        operator: &Caller,
        user: UserId,
        amount: u32,
    ) -> Result<TopUpReceipt, BookingError> {
        self.authorize(operator)?;
        if amount == 0 {
            return Err(BookingError::InvalidConfig(
                "top-up amount must be greater than 0".into(),
            ));
        }
        let balance = self
            .credits
            .adjust(user, i64::from(amount), LedgerReason::AdminTopUp);
        tracing::info!(operator = %operator.user, %user, amount, balance, "credits granted");
        self.publish(vec![build_event(
            EventKind::UserChanged,
            None,
            Some(user),
            None,
        )]);
        Ok(TopUpReceipt {
            user_id: user,
            balance,
        })
    }

    /// Check the cross-ledger invariants: occupancy matches the reservation
    /// count and stays within capacity, no user is both booked and
    /// waitlisted, and every balance equals its ledger sum.
    ///
    /// A failure here indicates a bug in the transaction boundary, never a
    /// condition to correct silently.
    pub fn verify_consistency(&self) -> Result<(), BookingError> {
        for snapshot in self.catalog.snapshot_all() {
            let booked = self.reservations.count_for_class(snapshot.id);
            let booked = u32::try_from(booked).unwrap_or(u32::MAX);
            if snapshot.occupancy != booked || snapshot.occupancy > snapshot.capacity {
                return Err(self.escalate(
                    BookingError::CapacityExceeded(format!(
                        "class {}: occupancy {} vs {} reservations, capacity {}",
                        snapshot.id, snapshot.occupancy, booked, snapshot.capacity
                    )),
                    "consistency check",
                ));
            }
            for user in self.reservations.list_by_class(snapshot.id) {
                if self.waitlist.contains(user, snapshot.id) {
                    return Err(self.escalate(
                        BookingError::CapacityExceeded(format!(
                            "user {user} both booked and waitlisted on class {}",
                            snapshot.id
                        )),
                        "consistency check",
                    ));
                }
            }
        }
        for (user, balance) in self.credits.balances() {
            let sum = self.credits.ledger_sum(user);
            if balance != sum {
                return Err(self.escalate(
                    BookingError::CapacityExceeded(format!(
                        "user {user}: balance {balance} != ledger sum {sum}"
                    )),
                    "consistency check",
                ));
            }
        }
        Ok(())
    }

    /// Book `user` into `class`: claim a slot, record the reservation, drop a
    /// stale waitlist entry, debit the cost. Called with the class lock held.
    fn create_booking(
        &self,
        user: UserId,
        class: ClassId,
        now_guard: Option<DateTime<Utc>>,
        reason: LedgerReason,
    ) -> Result<(BookingReceipt, String), BookingError> {
        let snapshot = self.catalog.get(class)?;
        if let Some(now) = now_guard {
            if snapshot.starts_at <= now {
                return Err(BookingError::ClassStarted);
            }
        }
        if self.reservations.contains(user, class) {
            return Err(BookingError::AlreadyBooked);
        }
        if snapshot.occupancy >= snapshot.capacity {
            return Err(BookingError::ClassFull);
        }
        let occupancy = self
            .catalog
            .adjust_occupancy(class, 1)
            .map_err(|e| self.escalate(e, "claim slot"))?;
        if let Err(err) = self.reservations.create(user, class) {
            let _ = self
                .catalog
                .adjust_occupancy(class, -1)
                .map_err(|e| self.escalate(e, "roll back slot claim"));
            return Err(err);
        }
        if self.waitlist.leave(user, class).is_ok() {
            tracing::debug!(%user, %class, "dropped stale waitlist entry during booking");
        }
        let balance = self.credits.adjust(user, -self.limits.booking_cost, reason);
        let receipt = BookingReceipt {
            class_id: class,
            user_id: user,
            occupancy,
            balance,
        };
        Ok((receipt, snapshot.month_key()))
    }

    /// Remove `user`'s booking from `class`, refund the cost, and promote
    /// the earliest waitlisted member if one exists. Called with the class
    /// lock held. Credits are adjusted only after every fallible step has
    /// succeeded, so the append-only ledger never needs compensation entries.
    fn remove_booking(
        &self,
        user: UserId,
        class: ClassId,
        now_guard: Option<DateTime<Utc>>,
        refund_reason: LedgerReason,
    ) -> Result<(CancellationReceipt, String), BookingError> {
        let snapshot = self.catalog.get(class)?;
        if let Some(now) = now_guard {
            if snapshot.starts_at <= now {
                return Err(BookingError::ClassStarted);
            }
        }
        self.reservations.remove(user, class)?;
        let mut occupancy = match self.catalog.adjust_occupancy(class, -1) {
            Ok(occupancy) => occupancy,
            Err(err) => {
                let _ = self.reservations.create(user, class);
                return Err(self.escalate(err, "release slot"));
            }
        };

        let mut promoted = None;
        if let Some(entry) = self.waitlist.pop_next(class) {
            let candidate = entry.user;
            if let Err(err) = self.reservations.create(candidate, class) {
                self.waitlist.push_front(class, entry);
                let _ = self.reservations.create(user, class);
                let _ = self.catalog.adjust_occupancy(class, 1);
                return Err(self.escalate(
                    BookingError::CapacityExceeded(format!(
                        "waitlisted user {candidate} already booked on class {class}: {err}"
                    )),
                    "promote from waitlist",
                ));
            }
            match self.catalog.adjust_occupancy(class, 1) {
                Ok(next) => {
                    occupancy = next;
                    promoted = Some(candidate);
                }
                Err(err) => {
                    let _ = self.reservations.remove(candidate, class);
                    self.waitlist.push_front(class, entry);
                    let _ = self.reservations.create(user, class);
                    let _ = self.catalog.adjust_occupancy(class, 1);
                    return Err(self.escalate(err, "reclaim slot for promotion"));
                }
            }
        }

        let balance = self
            .credits
            .adjust(user, self.limits.booking_cost, refund_reason);
        if let Some(candidate) = promoted {
            self.credits
                .adjust(candidate, -self.limits.booking_cost, LedgerReason::AdminBooking);
        }
        let receipt = CancellationReceipt {
            class_id: class,
            user_id: user,
            occupancy,
            balance,
            promoted,
        };
        Ok((receipt, snapshot.month_key()))
    }

    /// Events describing a committed cancellation or admin removal.
    fn cancellation_events(
        &self,
        receipt: &CancellationReceipt,
        month: String,
    ) -> Vec<StudioEvent> {
        let class = receipt.class_id;
        let mut events = vec![
            build_event(EventKind::ClassChanged, Some(class), None, Some(month.clone())),
            build_event(EventKind::UserChanged, None, Some(receipt.user_id), None),
        ];
        if let Some(candidate) = receipt.promoted {
            events.push(build_event(
                EventKind::UserPromoted,
                Some(class),
                Some(candidate),
                Some(month),
            ));
            events.push(build_event(EventKind::UserChanged, None, Some(candidate), None));
        } else {
            events.push(build_event(
                EventKind::SlotFreed,
                Some(class),
                None,
                Some(month),
            ));
        }
        events
    }

    /// Reject callers without the operator role; checked once here, at the
    /// coordinator boundary, rather than per call site.
    fn authorize(&self, operator: &Caller) -> Result<(), BookingError> {
        if operator.role != Role::Operator {
            tracing::warn!(user = %operator.user, "operator action rejected");
            return Err(BookingError::Forbidden);
        }
        Ok(())
    }

    /// Track an operation as in flight, rejecting a concurrent duplicate for
    /// the same (user, class, operation) tuple instead of queueing it.
    fn begin_in_flight(
        &self,
        user: UserId,
        class: ClassId,
        op: OpKind,
    ) -> Result<InFlightGuard, BookingError> {
        let key = (user, class, op);
        if !self.in_flight.lock().insert(key) {
            tracing::debug!(%user, %class, ?op, "duplicate request rejected");
            return Err(BookingError::RequestInFlight);
        }
        Ok(InFlightGuard {
            set: Arc::clone(&self.in_flight),
            key,
        })
    }

    /// Run `f` while holding the class transaction lock.
    ///
    /// Acquisition is bounded: `max_txn_attempts` tries of `lock_timeout`
    /// each, then `TransactionConflict`. Only the failed transaction retries;
    /// it never re-queues behind other waiters.
    fn with_class_txn<R>(
        &self,
        class: ClassId,
        f: impl FnOnce() -> Result<R, BookingError>,
    ) -> Result<R, BookingError> {
        let lock = Arc::clone(self.class_locks.lock().entry(class).or_default());
        let mut acquired = None;
        for attempt in 1..=self.limits.max_txn_attempts {
            if let Some(guard) = lock.try_lock_for(self.limits.lock_timeout) {
                acquired = Some(guard);
                break;
            }
            tracing::debug!(%class, attempt, "class transaction lock busy");
        }
        match acquired {
            Some(_guard) => f(),
            None => {
                tracing::warn!(
                    %class,
                    attempts = self.limits.max_txn_attempts,
                    "transaction retries exhausted"
                );
                Err(BookingError::TransactionConflict(format!(
                    "transactions on class {class} are contended"
                )))
            }
        }
    }

    /// Log fatal invariant breaches before surfacing them.
    fn escalate(&self, err: BookingError, context: &'static str) -> BookingError {
        if err.is_fatal() {
            tracing::error!(error = %err, context, "invariant violation");
        }
        err
    }

    /// Fan a batch of committed events out to every registered sink.
    fn publish(&self, events: Vec<StudioEvent>) {
        for event in events {
            for sink in &self.sinks {
                sink.lock().publish(event.clone());
            }
        }
    }
}
