//! Postgres persistence stubs (schema-only; DB I/O not wired).
//!
//! Schema mirrors the studio's system of record: classes, bookings, the
//! payments ledger, and waitlist rows.

use crate::core::events::{EventSink, StudioEvent};

/// Postgres-backed event sink (schema-only; DB I/O not wired).
pub struct PostgresEventSink;

impl PostgresEventSink {
    /// Returns SQL migration statements for the booking schema.
    pub fn migrations() -> &'static [&'static str] {
        &[
            r#"
CREATE TABLE IF NOT EXISTS classes (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    trainer TEXT,
    starts_at TIMESTAMPTZ NOT NULL,
    capacity INT NOT NULL CHECK (capacity > 0),
    booked_slots INT NOT NULL DEFAULT 0 CHECK (booked_slots >= 0 AND booked_slots <= capacity)
);
CREATE INDEX IF NOT EXISTS idx_classes_starts_at ON classes (starts_at);
"#,
            r#"
CREATE TABLE IF NOT EXISTS bookings (
    user_id UUID NOT NULL,
    class_id UUID NOT NULL REFERENCES classes (id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (user_id, class_id)
);
CREATE INDEX IF NOT EXISTS idx_bookings_class ON bookings (class_id);
"#,
            r#"
CREATE TABLE IF NOT EXISTS payments (
    id BIGSERIAL PRIMARY KEY,
    user_id UUID NOT NULL,
    credits BIGINT NOT NULL,
    reason TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_payments_user_created ON payments (user_id, created_at);
"#,
            r#"
CREATE TABLE IF NOT EXISTS waitlist (
    user_id UUID NOT NULL,
    class_id UUID NOT NULL REFERENCES classes (id) ON DELETE CASCADE,
    joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    seq BIGINT NOT NULL,
    PRIMARY KEY (user_id, class_id)
);
CREATE INDEX IF NOT EXISTS idx_waitlist_class_seq ON waitlist (class_id, seq);
"#,
        ]
    }
}

impl EventSink for PostgresEventSink {
    fn publish(&mut self, _event: StudioEvent) {
        // Stub: actual DB writes require a runtime + client; left to the
        // integration layer.
    }
}
