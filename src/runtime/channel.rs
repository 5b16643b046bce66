//! Tokio channel event sink for asynchronous notification delivery.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::core::events::{EventSink, StudioEvent};

/// Forwards committed-change events into a tokio channel.
///
/// Delivery is fire-and-forget: the send never blocks the committing
/// transaction, and events are discarded once the receiver is dropped.
/// Notification workers (e.g. "you were promoted" messaging) consume the
/// receiver on their own runtime.
pub struct ChannelEventSink {
    tx: UnboundedSender<StudioEvent>,
}

impl ChannelEventSink {
    /// Create a sink and the receiver its events arrive on.
    pub fn new() -> (Self, UnboundedReceiver<StudioEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn publish(&mut self, event: StudioEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("event receiver dropped; notification discarded");
        }
    }
}
