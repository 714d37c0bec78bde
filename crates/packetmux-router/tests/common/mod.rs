//! Shared fixtures for router integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use packetmux_core::Packet;
use packetmux_router::config::MuxConfig;
use packetmux_router::{Client, MemoryBroker};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathQuestion {
    pub question: String,
    pub response: i32,
}

impl MathQuestion {
    pub fn new(question: &str, response: i32) -> Self {
        Self {
            question: question.to_string(),
            response,
        }
    }
}

impl Packet for MathQuestion {
    const TAG: &'static str = "MathQuestionPacket";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ping {
    pub n: u32,
}

impl Packet for Ping {
    const TAG: &'static str = "Ping";
}

/// Two clients sharing one in-memory broker.
pub fn pair() -> (Arc<MemoryBroker>, Client, Client) {
    let broker = Arc::new(MemoryBroker::new());
    let a = Client::start(&MuxConfig::named("ClientA"), broker.clone()).unwrap();
    let b = Client::start(&MuxConfig::named("ClientB"), broker.clone()).unwrap();
    (broker, a, b)
}

pub async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for callback")
        .expect("callback channel closed")
}

/// Give the dispatch tasks a chance to drain.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
