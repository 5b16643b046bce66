//! Read-side adapters fed by the coordinator's change signal.

pub mod postgres;
pub mod view_cache;

pub use postgres::PostgresEventSink;
pub use view_cache::MonthKeyedCache;
