use std::sync::Arc;

use tokio::sync::mpsc;

use packetmux_core::protocol::envelope;
use packetmux_core::Result;

use crate::dispatch::HandlerTable;
use crate::listeners::ListenerRegistry;
use crate::transport::Delivery;

/// Where an envelope ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Matched a registry entry by id.
    Correlated,
    /// Matched a type handler by tag.
    Fresh,
    /// Matched neither.
    Dropped,
}

/// Inbound dispatcher: correlation id first, type tag second, else drop.
///
/// At most one handler runs per envelope.
pub struct Dispatcher {
    registry: Arc<ListenerRegistry>,
    handlers: Arc<HandlerTable>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ListenerRegistry>, handlers: Arc<HandlerTable>) -> Self {
        Self { registry, handlers }
    }

    pub fn on_message(&self, topic: &str, raw: &[u8]) -> Result<Route> {
        let env = envelope::decode(raw)?;

        if let Some(listener) = self.registry.lookup(&env.id) {
            tracing::trace!(%topic, id = %env.id, kind = listener.kind().as_str(), "correlated");
            listener.deliver(&env)?;
            return Ok(Route::Correlated);
        }

        if self.handlers.dispatch(&env)? {
            return Ok(Route::Fresh);
        }

        tracing::debug!(%topic, id = %env.id, clazz = %env.type_tag, source = %env.source, "no listener or handler; dropped");
        Ok(Route::Dropped)
    }

    /// Drain `inbox` until every sender is gone. Per-message failures are
    /// logged and the loop moves on.
    pub async fn drain(&self, mut inbox: mpsc::UnboundedReceiver<Delivery>) {
        while let Some(d) = inbox.recv().await {
            if let Err(e) = self.on_message(&d.topic, &d.payload) {
                tracing::warn!(topic = %d.topic, code = e.code().as_str(), error = %e, "inbound message dropped");
            }
        }
        tracing::debug!("inbox closed; dispatcher stopped");
    }
}
