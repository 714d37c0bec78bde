//! Client facade.
//!
//! A `Client` owns everything a process needs to route packets: its outbound
//! path, the listener registry, the type dispatch table, conversation
//! acceptance rules, and the task draining its inbox. Clones share state;
//! the last clone dropped (or [`Client::shutdown`]) stops the dispatch task.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use packetmux_core::protocol::{ConversationEnd, ConversationStart};
use packetmux_core::{Codec, MuxError, Packet, Received, Result};

use crate::config::MuxConfig;
use crate::dispatch::{Dispatcher, HandlerTable};
use crate::listeners::{
    Acceptors, Channel, Conversation, Expiry, ListenerKind, ListenerRegistry, ReplyListener,
    State, TypeHandler,
};
use crate::outbox::{fresh_id, Outbox};
use crate::transport::Transport;

#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    outbox: Arc<Outbox>,
    registry: Arc<ListenerRegistry>,
    handlers: Arc<HandlerTable>,
    acceptors: Arc<Acceptors>,
    default_codec: Arc<dyn Codec>,
    reply_expiry: Expiry,
    runtime: Handle,
    pump: AbortHandle,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

impl Client {
    /// Subscribe to the client's own topic and start draining it.
    ///
    /// Must be called from within a tokio runtime; reply timers and the
    /// dispatch task run on it.
    pub fn start(cfg: &MuxConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        cfg.validate()?;
        let runtime = Handle::try_current()
            .map_err(|e| MuxError::Internal(format!("client must start inside a tokio runtime: {e}")))?;

        let name = cfg.client_name();
        let default_codec = cfg.default_codec();

        let (tx, rx) = mpsc::unbounded_channel();
        transport.subscribe(&name, tx.clone())?;

        let outbox = Arc::new(Outbox::new(name.as_str(), transport.clone()));
        let registry = Arc::new(ListenerRegistry::new(transport, tx));
        let handlers = Arc::new(HandlerTable::new());
        let acceptors = Arc::new(Acceptors::new());

        register_conversation_handshakes(&handlers, &registry, &acceptors, &default_codec)?;

        let dispatcher = Dispatcher::new(registry.clone(), handlers.clone());
        let pump = runtime
            .spawn(async move { dispatcher.drain(rx).await })
            .abort_handle();

        tracing::info!(client = %name, codec = default_codec.name(), "packetmux client started");

        Ok(Self {
            inner: Arc::new(ClientInner {
                outbox,
                registry,
                handlers,
                acceptors,
                default_codec,
                reply_expiry: cfg.reply_expiry(),
                runtime,
                pump,
            }),
        })
    }

    pub fn name(&self) -> &str {
        self.inner.outbox.client_name()
    }

    pub fn default_codec(&self) -> Arc<dyn Codec> {
        Arc::clone(&self.inner.default_codec)
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.inner.registry
    }

    pub fn handlers(&self) -> &HandlerTable {
        &self.inner.handlers
    }

    // ---- sending

    /// Fire-and-forget under a fresh id. Returns the id.
    pub fn send<P: Packet>(&self, target: &str, packet: &P) -> Result<String> {
        self.send_with_codec(target, packet, self.inner.default_codec.as_ref())
    }

    pub fn send_with_codec<P: Packet>(&self, target: &str, packet: &P, codec: &dyn Codec) -> Result<String> {
        self.inner.outbox.send(target, packet, codec)
    }

    /// Send under an explicit correlation id.
    pub fn send_with_id<P: Packet>(&self, target: &str, packet: &P, id: &str, codec: &dyn Codec) -> Result<()> {
        self.inner.outbox.send_with_id(target, packet, id, codec)
    }

    /// Send `packet` and call `on_reply` with the first packet that comes
    /// back under the same id. Uses the configured expiry; an expired request
    /// is removed silently and `on_reply` never runs.
    pub fn send_with_reply<P, F>(&self, target: &str, packet: &P, on_reply: F) -> Result<String>
    where
        P: Packet,
        F: FnOnce(Received<P>) + Send + 'static,
    {
        self.send_with_reply_using(target, packet, on_reply, self.inner.reply_expiry, self.default_codec())
    }

    pub fn send_with_reply_using<P, F>(
        &self,
        target: &str,
        packet: &P,
        on_reply: F,
        expiry: Expiry,
        codec: Arc<dyn Codec>,
    ) -> Result<String>
    where
        P: Packet,
        F: FnOnce(Received<P>) + Send + 'static,
    {
        let id = fresh_id();
        let listener = Arc::new(ReplyListener::<P>::new(
            id.clone(),
            codec.clone(),
            Arc::downgrade(&self.inner.registry),
            on_reply,
        ));

        // registered before publishing so a fast reply cannot miss it
        self.inner.registry.register(id.clone(), listener.clone(), false)?;
        if let Err(e) = self.inner.outbox.send_with_id(target, packet, &id, codec.as_ref()) {
            self.inner.registry.unregister(&id);
            return Err(e);
        }

        listener.arm(&self.inner.runtime, expiry);
        Ok(id)
    }

    // ---- receiving fresh packets

    /// Handle every fresh packet of type `P`. One handler per type.
    pub fn on_receive<P, F>(&self, handler: F) -> Result<()>
    where
        P: Packet,
        F: Fn(Received<P>) + Send + Sync + 'static,
    {
        self.on_receive_with_codec(self.default_codec(), handler)
    }

    pub fn on_receive_with_codec<P, F>(&self, codec: Arc<dyn Codec>, handler: F) -> Result<()>
    where
        P: Packet,
        F: Fn(Received<P>) + Send + Sync + 'static,
    {
        self.inner
            .handlers
            .register(P::TAG, Arc::new(TypeHandler::<P>::new(codec, handler)))
    }

    /// Answer every fresh packet of type `P`: the returned packet goes back
    /// to the sender under the request's id.
    pub fn on_request<P, F>(&self, respond: F) -> Result<()>
    where
        P: Packet,
        F: Fn(Received<P>) -> P + Send + Sync + 'static,
    {
        self.on_request_with_codec(self.default_codec(), respond)
    }

    pub fn on_request_with_codec<P, F>(&self, codec: Arc<dyn Codec>, respond: F) -> Result<()>
    where
        P: Packet,
        F: Fn(Received<P>) -> P + Send + Sync + 'static,
    {
        let outbox = Arc::clone(&self.inner.outbox);
        let reply_codec = codec.clone();
        let handler = TypeHandler::<P>::new(codec, move |request: Received<P>| {
            let target = request.source.clone();
            let id = request.id.clone();
            let reply = respond(request);
            if let Err(e) = outbox.send_with_id(&target, &reply, &id, reply_codec.as_ref()) {
                tracing::warn!(%target, %id, clazz = P::TAG, error = %e, "reply send failed");
            }
        });
        self.inner.handlers.register(P::TAG, Arc::new(handler))
    }

    // ---- conversations

    /// Open a conversation with `target` carrying `P`, starting in
    /// `initial_state`. Attach state handlers on the returned value.
    pub fn create_conversation<P: Packet>(&self, target: &str, initial_state: State) -> Result<Arc<Conversation<P>>> {
        self.create_conversation_with_codec(target, initial_state, self.default_codec())
    }

    pub fn create_conversation_with_codec<P: Packet>(
        &self,
        target: &str,
        initial_state: State,
        codec: Arc<dyn Codec>,
    ) -> Result<Arc<Conversation<P>>> {
        let id = fresh_id();
        let conversation = Arc::new(Conversation::<P>::new(
            id.clone(),
            target,
            initial_state,
            codec,
            Arc::clone(&self.inner.outbox),
            Arc::downgrade(&self.inner.registry),
        ));

        self.inner.registry.register(id.clone(), conversation.clone(), false)?;
        if let Err(e) = conversation.start() {
            self.inner.registry.unregister(&id);
            return Err(e);
        }
        tracing::debug!(%id, %target, clazz = P::TAG, "conversation started");
        Ok(conversation)
    }

    /// Accept conversations carrying `P` opened by any peer. The accepted
    /// side starts in `initial_state`; `on_accepted` runs once per
    /// conversation, before any data packet for it is dispatched.
    pub fn accept_conversation<P, F>(&self, initial_state: State, on_accepted: F) -> Result<()>
    where
        P: Packet,
        F: Fn(Arc<Conversation<P>>) + Send + Sync + 'static,
    {
        self.accept_conversation_with_codec(initial_state, self.default_codec(), on_accepted)
    }

    pub fn accept_conversation_with_codec<P, F>(
        &self,
        initial_state: State,
        codec: Arc<dyn Codec>,
        on_accepted: F,
    ) -> Result<()>
    where
        P: Packet,
        F: Fn(Arc<Conversation<P>>) + Send + Sync + 'static,
    {
        self.inner.acceptors.register::<P, F>(
            initial_state,
            codec,
            Arc::clone(&self.inner.outbox),
            Arc::downgrade(&self.inner.registry),
            on_accepted,
        )
    }

    // ---- channels

    /// Join the broadcast channel `name`. One channel per name per client.
    pub fn enter_channel<P: Packet>(&self, name: &str) -> Result<Arc<Channel<P>>> {
        self.enter_channel_with_codec(name, self.default_codec())
    }

    pub fn enter_channel_with_codec<P: Packet>(&self, name: &str, codec: Arc<dyn Codec>) -> Result<Arc<Channel<P>>> {
        let channel = Arc::new(Channel::<P>::new(name, codec, Arc::clone(&self.inner.outbox)));
        self.inner.registry.register_unique(name, channel.clone(), true)?;
        Ok(channel)
    }

    /// Stop dispatching and drop every listener, handler, and acceptance
    /// rule. Publishing still works; nothing is received any more.
    pub fn shutdown(&self) {
        self.inner.pump.abort();
        self.inner.registry.clear();
        self.inner.handlers.clear();
        self.inner.acceptors.clear();
        tracing::info!(client = %self.name(), "packetmux client stopped");
    }
}

/// Wire the built-in handlers that open and close conversations.
fn register_conversation_handshakes(
    handlers: &HandlerTable,
    registry: &Arc<ListenerRegistry>,
    acceptors: &Arc<Acceptors>,
    codec: &Arc<dyn Codec>,
) -> Result<()> {
    let acceptors = Arc::clone(acceptors);
    handlers.register(
        ConversationStart::TAG,
        Arc::new(TypeHandler::<ConversationStart>::new(codec.clone(), move |start| {
            if let Err(e) = acceptors.accept_start(&start) {
                tracing::warn!(id = %start.conversation_id, source = %start.source, error = %e, "conversation accept failed");
            }
        })),
    )?;

    let registry = Arc::downgrade(registry);
    handlers.register(
        ConversationEnd::TAG,
        Arc::new(TypeHandler::<ConversationEnd>::new(codec.clone(), move |end| {
            let Some(registry) = registry.upgrade() else {
                return;
            };
            if registry.unregister_kind(&end.conversation_id, ListenerKind::Conversation) {
                tracing::debug!(id = %end.conversation_id, source = %end.source, "conversation closed by peer");
            }
        })),
    )?;
    Ok(())
}
