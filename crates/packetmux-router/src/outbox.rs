//! Outbound framing: stamp the client identity, encode, publish.

use std::sync::Arc;

use uuid::Uuid;

use packetmux_core::protocol::envelope;
use packetmux_core::{Codec, Packet, Result};

use crate::transport::Transport;

/// Fresh random correlation id.
pub fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

/// Shared send path for the client and every listener that talks back.
pub struct Outbox {
    client_name: Arc<str>,
    transport: Arc<dyn Transport>,
}

impl Outbox {
    pub fn new(client_name: impl Into<Arc<str>>, transport: Arc<dyn Transport>) -> Self {
        Self {
            client_name: client_name.into(),
            transport,
        }
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Publish `packet` on `target`'s topic under an explicit correlation id.
    pub fn send_with_id<P: Packet>(&self, target: &str, packet: &P, id: &str, codec: &dyn Codec) -> Result<()> {
        let raw = envelope::encode(codec, packet, id, &self.client_name)?;
        let delivered = self.transport.publish(target, raw)?;
        tracing::trace!(%target, %id, clazz = P::TAG, delivered, "published");
        Ok(())
    }

    /// Publish under a fresh id and return it.
    pub fn send<P: Packet>(&self, target: &str, packet: &P, codec: &dyn Codec) -> Result<String> {
        let id = fresh_id();
        self.send_with_id(target, packet, &id, codec)?;
        Ok(id)
    }
}
