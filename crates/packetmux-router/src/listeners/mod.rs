//! Listener variants and the registry that owns them.
//!
//! Every consumer of inbound packets implements [`PacketListener`] for its
//! concrete payload type. The blanket [`Listener`] impl erases that type so
//! the registry and the type dispatch table can store all variants side by
//! side and hand them raw envelopes.

pub mod channel;
pub mod conversation;
pub mod handler;
pub mod registry;
pub mod reply;

use packetmux_core::protocol::Envelope;
use packetmux_core::{Codec, Packet, Received, Result};

pub use channel::Channel;
pub use conversation::{Acceptors, Conversation, State, UNBOUNDED_STATE};
pub use handler::TypeHandler;
pub use registry::ListenerRegistry;
pub use reply::{Expiry, ReplyListener, DEFAULT_REPLY_TIMEOUT};

/// Which variant sits behind a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Reply,
    Channel,
    Conversation,
    TypeHandler,
}

impl ListenerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListenerKind::Reply => "reply",
            ListenerKind::Channel => "channel",
            ListenerKind::Conversation => "conversation",
            ListenerKind::TypeHandler => "type_handler",
        }
    }
}

/// Typed consumer of one payload type.
pub trait PacketListener: Send + Sync {
    type Packet: Packet;

    fn kind(&self) -> ListenerKind;
    fn codec(&self) -> &dyn Codec;
    fn accept(&self, packet: Received<Self::Packet>);
}

/// Type-erased listener as stored by the registry and the dispatch table.
pub trait Listener: Send + Sync {
    fn kind(&self) -> ListenerKind;
    /// Type tag of the payload this listener decodes.
    fn payload_type(&self) -> &'static str;
    fn codec(&self) -> &dyn Codec;
    /// Decode `env` with this listener's type and codec, then consume it.
    fn deliver(&self, env: &Envelope) -> Result<()>;
}

impl<L: PacketListener> Listener for L {
    fn kind(&self) -> ListenerKind {
        PacketListener::kind(self)
    }

    fn payload_type(&self) -> &'static str {
        <L::Packet as Packet>::TAG
    }

    fn codec(&self) -> &dyn Codec {
        PacketListener::codec(self)
    }

    fn deliver(&self, env: &Envelope) -> Result<()> {
        let packet = env.open::<L::Packet>(PacketListener::codec(self))?;
        self.accept(packet);
        Ok(())
    }
}
