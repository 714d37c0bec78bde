//! Listener registry against a transport that refuses some topics.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use packetmux_core::{Codec, JsonCodec, MuxError, Result};
use packetmux_router::listeners::{Listener, ListenerKind, ListenerRegistry, TypeHandler};
use packetmux_router::transport::{Delivery, Inbox, Transport};

mod common;
use common::{MathQuestion, Ping};

/// Accepts every subscription except to `refused`.
struct Refusing {
    refused: &'static str,
}

impl Transport for Refusing {
    fn subscribe(&self, topic: &str, _inbox: Inbox) -> Result<()> {
        if topic == self.refused {
            return Err(MuxError::Transport(format!("subscribe {topic} refused")));
        }
        Ok(())
    }

    fn publish(&self, _topic: &str, _payload: Bytes) -> Result<usize> {
        Ok(0)
    }
}

fn registry(refused: &'static str) -> (ListenerRegistry, mpsc::UnboundedReceiver<Delivery>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ListenerRegistry::new(Arc::new(Refusing { refused }), tx), rx)
}

fn codec() -> Arc<dyn Codec> {
    Arc::new(JsonCodec::compact())
}

fn math() -> Arc<dyn Listener> {
    Arc::new(TypeHandler::<MathQuestion>::new(codec(), |_| {}))
}

fn ping() -> Arc<dyn Listener> {
    Arc::new(TypeHandler::<Ping>::new(codec(), |_| {}))
}

#[test]
fn failed_subscribe_restores_previous_entry() {
    let (reg, _rx) = registry("math");
    reg.register("math", math(), false).unwrap();

    let err = reg.register("math", ping(), true).expect_err("must fail");
    assert_eq!(err.code().as_str(), "TRANSPORT");

    let kept = reg.lookup("math").expect("previous entry restored");
    assert_eq!(kept.payload_type(), "MathQuestionPacket");
}

#[test]
fn failed_subscribe_on_fresh_key_leaves_nothing() {
    let (reg, _rx) = registry("math");
    assert!(reg.register("math", math(), true).is_err());
    assert!(!reg.contains("math"));
    assert!(reg.is_empty());
}

#[test]
fn register_unique_rejects_same_kind_only() {
    let (reg, _rx) = registry("none");
    reg.register_unique("k", math(), true).unwrap();

    let err = reg.register_unique("k", ping(), true).expect_err("must fail");
    assert_eq!(err.code().as_str(), "DUPLICATE_HANDLER");
    assert_eq!(reg.lookup("k").unwrap().payload_type(), "MathQuestionPacket");
    assert_eq!(reg.lookup("k").unwrap().kind(), ListenerKind::TypeHandler);
}
