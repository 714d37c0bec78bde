//! Two-party conversations.
//!
//! A conversation is a registry entry keyed by a generated conversation id.
//! Inbound packets for that id are handed to the handler registered for the
//! *local* current state; the peer never moves our state. The initiator sends
//! a `ConversationStart` handshake, the acceptor builds its side from an
//! acceptance rule registered ahead of time, and either side ends it with
//! `ConversationEnd`.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use packetmux_core::protocol::{ConversationEnd, ConversationStart};
use packetmux_core::{Codec, MuxError, Packet, Received, Result};

use crate::listeners::{ListenerKind, ListenerRegistry, PacketListener};
use crate::outbox::Outbox;

/// Caller-defined conversation state.
pub type State = i32;

/// Default state. Handlers registered for it (see
/// [`Conversation::on_receive`]) act as a single state-independent handler.
pub const UNBOUNDED_STATE: State = State::MAX;

type StateHandler<P> = Arc<dyn Fn(&Conversation<P>, Received<P>) + Send + Sync>;

pub struct Conversation<P: Packet> {
    id: String,
    target: String,
    state: AtomicI32,
    handlers: DashMap<State, StateHandler<P>>,
    codec: Arc<dyn Codec>,
    outbox: Arc<Outbox>,
    registry: Weak<ListenerRegistry>,
}

impl<P: Packet> Conversation<P> {
    pub fn new(
        id: impl Into<String>,
        target: impl Into<String>,
        initial_state: State,
        codec: Arc<dyn Codec>,
        outbox: Arc<Outbox>,
        registry: Weak<ListenerRegistry>,
    ) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            state: AtomicI32::new(initial_state),
            handlers: DashMap::new(),
            codec,
            outbox,
            registry,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identity of the other party.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn state(&self) -> State {
        self.state.load(Ordering::Acquire)
    }

    /// Handle inbound packets that arrive while in `state`. Replaces any
    /// handler already registered for `state`.
    pub fn on_state<F>(&self, state: State, handler: F) -> &Self
    where
        F: Fn(&Conversation<P>, Received<P>) + Send + Sync + 'static,
    {
        self.handlers.insert(state, Arc::new(handler));
        self
    }

    /// Handler for [`UNBOUNDED_STATE`].
    pub fn on_receive<F>(&self, handler: F) -> &Self
    where
        F: Fn(&Conversation<P>, Received<P>) + Send + Sync + 'static,
    {
        self.on_state(UNBOUNDED_STATE, handler)
    }

    /// Move to `state`, then send `packet` to the peer under this
    /// conversation's id. The state only changes how this side reads the
    /// next inbound packet.
    pub fn set_state(&self, state: State, packet: &P) -> Result<()> {
        self.state.store(state, Ordering::Release);
        self.outbox
            .send_with_id(&self.target, packet, &self.id, self.codec.as_ref())
    }

    /// Send the opening handshake. Initiator only.
    pub(crate) fn start(&self) -> Result<()> {
        let start = ConversationStart {
            clazz: P::TAG.to_string(),
            conversation_id: self.id.clone(),
        };
        self.outbox.send(&self.target, &start, self.codec.as_ref())?;
        Ok(())
    }

    /// Unregister locally and tell the peer to do the same.
    pub fn close(&self) -> Result<()> {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister_kind(&self.id, ListenerKind::Conversation);
        }
        let end = ConversationEnd {
            conversation_id: self.id.clone(),
        };
        self.outbox.send(&self.target, &end, self.codec.as_ref())?;
        tracing::debug!(id = %self.id, target = %self.target, "conversation closed");
        Ok(())
    }
}

impl<P: Packet> PacketListener for Conversation<P> {
    type Packet = P;

    fn kind(&self) -> ListenerKind {
        ListenerKind::Conversation
    }

    fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    fn accept(&self, packet: Received<P>) {
        let state = self.state();
        let handler = self.handlers.get(&state).map(|h| h.value().clone());
        match handler {
            Some(handler) => handler(self, packet),
            None => tracing::trace!(id = %self.id, state, "no handler for state; dropped"),
        }
    }
}

type Spawn = Arc<dyn Fn(&Received<ConversationStart>) -> Result<()> + Send + Sync>;

/// Acceptance rules: payload type tag -> how to build the accepting side.
///
/// One rule per type tag.
#[derive(Default)]
pub struct Acceptors {
    rules: DashMap<String, Spawn>,
}

impl Acceptors {
    pub fn new() -> Self {
        Self {
            rules: DashMap::new(),
        }
    }

    /// Accept conversations carrying `P`. Fails with
    /// `MuxError::DuplicateHandler` if a rule for `P` already exists.
    pub fn register<P, F>(
        &self,
        initial_state: State,
        codec: Arc<dyn Codec>,
        outbox: Arc<Outbox>,
        registry: Weak<ListenerRegistry>,
        on_accepted: F,
    ) -> Result<()>
    where
        P: Packet,
        F: Fn(Arc<Conversation<P>>) + Send + Sync + 'static,
    {
        let spawn: Spawn = Arc::new(move |start: &Received<ConversationStart>| {
            let Some(reg) = registry.upgrade() else {
                return Ok(());
            };
            let conversation = Arc::new(Conversation::<P>::new(
                start.conversation_id.clone(),
                start.source.clone(),
                initial_state,
                codec.clone(),
                outbox.clone(),
                registry.clone(),
            ));
            reg.register(start.conversation_id.clone(), conversation.clone(), false)?;
            tracing::debug!(id = %start.conversation_id, target = %start.source, clazz = P::TAG, "conversation accepted");
            on_accepted(conversation);
            Ok(())
        });

        match self.rules.entry(P::TAG.to_string()) {
            Entry::Occupied(_) => Err(MuxError::DuplicateHandler(format!("conversation {}", P::TAG))),
            Entry::Vacant(v) => {
                v.insert(spawn);
                Ok(())
            }
        }
    }

    /// Build the accepting side for an inbound handshake. Returns `false`
    /// when no rule matches its payload type.
    pub fn accept_start(&self, start: &Received<ConversationStart>) -> Result<bool> {
        let rule = self.rules.get(&start.clazz).map(|r| r.value().clone());
        let Some(spawn) = rule else {
            tracing::debug!(id = %start.conversation_id, clazz = %start.clazz, "no acceptance rule; dropped");
            return Ok(false);
        };
        spawn(start)?;
        Ok(true)
    }

    pub fn clear(&self) {
        self.rules.clear();
    }
}
