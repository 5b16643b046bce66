//! External API surface and runtime adapters.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod channel;

pub use api::{health, ErrorResponse, Health, MemberRequest, TopUpRequest};
#[cfg(feature = "tokio-runtime")]
pub use channel::ChannelEventSink;
