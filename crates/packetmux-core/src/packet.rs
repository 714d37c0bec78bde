//! Application payload contract.

use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A typed payload that can travel inside an envelope.
///
/// `TAG` is the bare type name written to the envelope's `clazz` field and is
/// what receivers route fresh packets on. Pick it once and keep it stable:
/// peers written against an older tag will silently drop the packet.
pub trait Packet: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TAG: &'static str;
}

/// A decoded packet together with the header fields it arrived under.
///
/// `id` and `source` travel in the envelope, never in the payload body.
#[derive(Debug, Clone, PartialEq)]
pub struct Received<P> {
    /// Correlation key (request id, channel name, or conversation id).
    pub id: String,
    /// Identity of the sending client.
    pub source: String,
    pub packet: P,
}

impl<P> Received<P> {
    pub fn into_inner(self) -> P {
        self.packet
    }
}

impl<P> Deref for Received<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.packet
    }
}
