// ── Realtime relay ──
//
// One socket per `RealtimeClient`, multiplexed into topics. Inbound
// events are normalized into the `TopicStore` and fanned out to the
// callbacks registered for their topic.

mod client;
mod registry;
mod task;

pub use client::RealtimeClient;
pub use registry::{Callback, SubscriptionId};

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Failed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}
