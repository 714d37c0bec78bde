//! One-shot reply listener.
//!
//! Registered under the request's correlation id on the client's own topic.
//! The reply path and the expiry timer both race for `claimed`; whichever
//! flips it first does the cleanup, the other returns without touching the
//! registry or the callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use packetmux_core::{Codec, Packet, Received};

use crate::listeners::{ListenerKind, ListenerRegistry, PacketListener};

pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_millis(5000);

/// How long a reply listener waits before removing itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    After(Duration),
    /// Never expire. The entry stays registered until a reply arrives.
    Never,
}

impl Expiry {
    /// `0` maps to [`Expiry::Never`].
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            Expiry::Never
        } else {
            Expiry::After(Duration::from_millis(ms))
        }
    }
}

impl Default for Expiry {
    fn default() -> Self {
        Expiry::After(DEFAULT_REPLY_TIMEOUT)
    }
}

type OnReply<P> = Box<dyn FnOnce(Received<P>) + Send>;

pub struct ReplyListener<P: Packet> {
    id: String,
    codec: Arc<dyn Codec>,
    on_reply: Mutex<Option<OnReply<P>>>,
    claimed: AtomicBool,
    timer: Mutex<Option<AbortHandle>>,
    registry: Weak<ListenerRegistry>,
}

impl<P: Packet> ReplyListener<P> {
    pub fn new<F>(id: String, codec: Arc<dyn Codec>, registry: Weak<ListenerRegistry>, on_reply: F) -> Self
    where
        F: FnOnce(Received<P>) + Send + 'static,
    {
        Self {
            id,
            codec,
            on_reply: Mutex::new(Some(Box::new(on_reply))),
            claimed: AtomicBool::new(false),
            timer: Mutex::new(None),
            registry,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the reply or the timer already fired.
    pub fn is_settled(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    /// Start the expiry timer on `runtime`. No-op for [`Expiry::Never`].
    ///
    /// The timer only holds a weak reference: once the registry drops the
    /// listener there is nothing left to expire.
    pub fn arm(self: &Arc<Self>, runtime: &Handle, expiry: Expiry) {
        let Expiry::After(after) = expiry else {
            return;
        };
        let me = Arc::downgrade(self);
        let task = runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(me) = me.upgrade() {
                me.expire();
            }
        });
        *self.timer.lock().unwrap_or_else(PoisonError::into_inner) = Some(task.abort_handle());
        // reply won while we were spawning
        if self.is_settled() {
            self.cancel_timer();
        }
    }

    /// Timer path: drop the registry entry without invoking the callback.
    pub fn expire(&self) {
        if self.claimed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.unregister();
        self.on_reply.lock().unwrap_or_else(PoisonError::into_inner).take();
        tracing::debug!(id = %self.id, clazz = P::TAG, "reply timed out");
    }

    fn unregister(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister_kind(&self.id, ListenerKind::Reply);
        }
    }

    fn cancel_timer(&self) {
        if let Some(timer) = self.timer.lock().unwrap_or_else(PoisonError::into_inner).take() {
            timer.abort();
        }
    }
}

impl<P: Packet> PacketListener for ReplyListener<P> {
    type Packet = P;

    fn kind(&self) -> ListenerKind {
        ListenerKind::Reply
    }

    fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    fn accept(&self, packet: Received<P>) {
        if self.claimed.swap(true, Ordering::AcqRel) {
            tracing::trace!(id = %self.id, "late reply ignored");
            return;
        }
        self.unregister();
        self.cancel_timer();

        let on_reply = self.on_reply.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(on_reply) = on_reply {
            on_reply(packet);
        }
    }
}
