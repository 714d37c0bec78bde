use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use packetmux_core::protocol::Envelope;
use packetmux_core::{MuxError, Result};

use crate::listeners::Listener;

/// Type dispatch table: `type tag -> handler` for packets that arrive without
/// a registered correlation id.
#[derive(Default)]
pub struct HandlerTable {
    handlers: DashMap<String, Arc<dyn Listener>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// One handler per type tag. A second registration fails and leaves the
    /// first one active.
    pub fn register(&self, type_tag: &str, handler: Arc<dyn Listener>) -> Result<()> {
        match self.handlers.entry(type_tag.to_string()) {
            Entry::Occupied(_) => Err(MuxError::DuplicateHandler(type_tag.to_string())),
            Entry::Vacant(v) => {
                v.insert(handler);
                tracing::debug!(clazz = %type_tag, "type handler registered");
                Ok(())
            }
        }
    }

    pub fn lookup(&self, type_tag: &str) -> Option<Arc<dyn Listener>> {
        self.handlers.get(type_tag).map(|e| e.value().clone())
    }

    /// Hand `env` to the handler for its type tag. Returns `false` when no
    /// handler is registered; that is not an error.
    pub fn dispatch(&self, env: &Envelope) -> Result<bool> {
        let Some(handler) = self.lookup(&env.type_tag) else {
            return Ok(false);
        };
        handler.deliver(env)?;
        Ok(true)
    }

    pub fn registered_types(&self) -> Vec<String> {
        self.handlers.iter().map(|e| e.key().clone()).collect()
    }

    pub fn clear(&self) {
        self.handlers.clear();
    }
}
