use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use packetmux_core::{MuxError, Result};

use crate::listeners::{Listener, ListenerKind};
use crate::transport::{Inbox, Transport};

/// Listener registry: `correlation key -> listener`.
///
/// Keys are request ids, channel names, or conversation ids. Registration
/// may also subscribe the transport to the key as a topic, because channel
/// names double as topic names; request and conversation ids ride the
/// client's own inbound topic.
pub struct ListenerRegistry {
    listeners: DashMap<String, Arc<dyn Listener>>,
    transport: Arc<dyn Transport>,
    inbox: Inbox,
}

impl ListenerRegistry {
    pub fn new(transport: Arc<dyn Transport>, inbox: Inbox) -> Self {
        Self {
            listeners: DashMap::new(),
            transport,
            inbox,
        }
    }

    /// Insert `listener` under `key`; last writer wins.
    ///
    /// The entry is in place before the subscription opens so nothing
    /// published on a fresh topic slips past it. A failed subscribe restores
    /// whatever was registered under `key` before.
    pub fn register(&self, key: impl Into<String>, listener: Arc<dyn Listener>, subscribe: bool) -> Result<()> {
        let key = key.into();
        let kind = listener.kind();
        let previous = self.listeners.insert(key.clone(), listener);
        if previous.is_some() {
            tracing::debug!(%key, kind = kind.as_str(), "listener replaced");
        }
        self.subscribe_or_restore(key, kind, previous, subscribe)
    }

    /// Like [`register`](Self::register), but fails with `DuplicateHandler`
    /// when `key` already holds a listener of the same kind. Check and insert
    /// happen under one shard lock.
    pub fn register_unique(&self, key: impl Into<String>, listener: Arc<dyn Listener>, subscribe: bool) -> Result<()> {
        let key = key.into();
        let kind = listener.kind();
        let previous = match self.listeners.entry(key.clone()) {
            Entry::Occupied(e) if e.get().kind() == kind => {
                return Err(MuxError::DuplicateHandler(format!("{} {key}", kind.as_str())));
            }
            Entry::Occupied(mut e) => Some(e.insert(listener)),
            Entry::Vacant(v) => {
                v.insert(listener);
                None
            }
        };
        self.subscribe_or_restore(key, kind, previous, subscribe)
    }

    fn subscribe_or_restore(
        &self,
        key: String,
        kind: ListenerKind,
        previous: Option<Arc<dyn Listener>>,
        subscribe: bool,
    ) -> Result<()> {
        if subscribe {
            if let Err(e) = self.transport.subscribe(&key, self.inbox.clone()) {
                match previous {
                    Some(prev) => {
                        self.listeners.insert(key, prev);
                    }
                    None => {
                        self.listeners.remove(&key);
                    }
                }
                return Err(e);
            }
        }

        tracing::debug!(%key, kind = kind.as_str(), subscribe, "listener registered");
        Ok(())
    }

    pub fn lookup(&self, key: &str) -> Option<Arc<dyn Listener>> {
        self.listeners.get(key).map(|e| e.value().clone())
    }

    /// Remove `key`. Idempotent; returns whether an entry was removed.
    pub fn unregister(&self, key: &str) -> bool {
        let removed = self.listeners.remove(key).is_some();
        if removed {
            tracing::debug!(%key, "listener unregistered");
        }
        removed
    }

    /// Remove `key` only if the entry is of `kind`.
    pub fn unregister_kind(&self, key: &str, kind: ListenerKind) -> bool {
        let removed = self.listeners.remove_if(key, |_, l| l.kind() == kind).is_some();
        if removed {
            tracing::debug!(%key, kind = kind.as_str(), "listener unregistered");
        }
        removed
    }

    pub fn contains(&self, key: &str) -> bool {
        self.listeners.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&self) {
        self.listeners.clear();
    }
}
