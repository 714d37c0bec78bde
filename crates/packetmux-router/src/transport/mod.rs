//! Pub/sub transport boundary.
//!
//! The router only needs two calls from a transport: subscribe a topic into
//! an inbox and publish bytes to a topic. Connection management, reconnects,
//! and delivery ordering are the transport's business.

pub mod memory;

use bytes::Bytes;
use tokio::sync::mpsc;

use packetmux_core::Result;

pub use memory::MemoryBroker;

/// One message received on a subscribed topic.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub topic: String,
    pub payload: Bytes,
}

/// Where a transport pushes deliveries for a client. Drained by the client's
/// dispatch task.
pub type Inbox = mpsc::UnboundedSender<Delivery>;

pub trait Transport: Send + Sync {
    /// Route every message published on `topic` into `inbox` from now on.
    /// Subscribing the same inbox twice must not duplicate deliveries.
    fn subscribe(&self, topic: &str, inbox: Inbox) -> Result<()>;

    /// Publish to all current subscribers of `topic`.
    /// Returns how many subscribers the message was handed to.
    fn publish(&self, topic: &str, payload: Bytes) -> Result<usize>;
}
