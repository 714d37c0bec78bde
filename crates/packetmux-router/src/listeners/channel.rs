use std::sync::{Arc, PoisonError, RwLock};

use packetmux_core::{Codec, Packet, Received, Result};

use crate::listeners::{ListenerKind, PacketListener};
use crate::outbox::Outbox;

type OnReceive<P> = Arc<dyn Fn(Received<P>) + Send + Sync>;

/// Durable broadcast topic.
///
/// The channel name is the transport topic, the registry key, and the
/// correlation id of every broadcast, so all members route it here. The
/// sender is subscribed to its own topic too; its own packets are dropped.
pub struct Channel<P: Packet> {
    name: String,
    codec: Arc<dyn Codec>,
    outbox: Arc<Outbox>,
    on_receive: RwLock<Option<OnReceive<P>>>,
}

impl<P: Packet> Channel<P> {
    pub fn new(name: impl Into<String>, codec: Arc<dyn Codec>, outbox: Arc<Outbox>) -> Self {
        Self {
            name: name.into(),
            codec,
            outbox,
            on_receive: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the delivery callback, replacing any previous one.
    pub fn on_receive<F>(&self, callback: F)
    where
        F: Fn(Received<P>) + Send + Sync + 'static,
    {
        *self.on_receive.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(callback));
    }

    pub fn broadcast(&self, packet: &P) -> Result<()> {
        self.outbox.send_with_id(&self.name, packet, &self.name, self.codec.as_ref())
    }
}

impl<P: Packet> PacketListener for Channel<P> {
    type Packet = P;

    fn kind(&self) -> ListenerKind {
        ListenerKind::Channel
    }

    fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    fn accept(&self, packet: Received<P>) {
        if packet.source == self.outbox.client_name() {
            return;
        }
        let callback = self
            .on_receive
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match callback {
            Some(callback) => callback(packet),
            None => tracing::trace!(channel = %self.name, source = %packet.source, "no receiver; dropped"),
        }
    }
}
