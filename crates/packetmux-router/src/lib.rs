//! packetmux router library entry.
//!
//! Wires the transport boundary, listener registry, type dispatch table, and
//! the listener variants (replies, channels, conversations) into a `Client`
//! that multiplexes typed packets over a handful of pub/sub topics.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod listeners;
pub mod outbox;
pub mod transport;

pub use client::Client;
pub use listeners::{Channel, Conversation, Expiry, State, UNBOUNDED_STATE};
pub use transport::{MemoryBroker, Transport};
