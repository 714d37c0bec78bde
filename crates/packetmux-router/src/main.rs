//! packetmux demo
//!
//! Two clients on an in-process broker:
//! - both join channel "math"; ClientA broadcasts, ClientB logs what it hears
//! - ClientA asks ClientB directly and waits for the answer
//!
//! Pass a YAML config path as the first argument to override ClientA's
//! settings. Run with `RUST_LOG=debug` to see routing decisions.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing_subscriber::{fmt, EnvFilter};

use packetmux_core::{Packet, Result};
use packetmux_router::config::{self, MuxConfig};
use packetmux_router::{Client, MemoryBroker};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MathQuestion {
    question: String,
    response: i32,
}

impl Packet for MathQuestion {
    const TAG: &'static str = "MathQuestionPacket";
}

fn solve(question: &str) -> i32 {
    question
        .split_once('+')
        .and_then(|(a, b)| Some(a.trim().parse::<i32>().ok()? + b.trim().parse::<i32>().ok()?))
        .unwrap_or(0)
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => config::load_from_file(&path)?,
        None => MuxConfig::named("ClientA"),
    };

    let broker = Arc::new(MemoryBroker::new());
    let a = Client::start(&cfg, broker.clone())?;
    let b = Client::start(&cfg.with_name("ClientB"), broker.clone())?;

    let math_b = b.enter_channel::<MathQuestion>("math")?;
    math_b.on_receive(|p| {
        tracing::info!(source = %p.source, question = %p.question, response = p.response, "received on math");
    });
    b.on_request::<MathQuestion, _>(|req| MathQuestion {
        response: solve(&req.question),
        question: req.into_inner().question,
    })?;

    let math_a = a.enter_channel::<MathQuestion>("math")?;
    math_a.broadcast(&MathQuestion {
        question: "2+2".into(),
        response: 0,
    })?;

    let (tx, rx) = oneshot::channel();
    let ask = MathQuestion {
        question: "3+4".into(),
        response: 0,
    };
    a.send_with_reply(b.name(), &ask, move |reply| {
        let _ = tx.send(reply.into_inner());
    })?;

    match tokio::time::timeout(Duration::from_secs(1), rx).await {
        Ok(Ok(answer)) => {
            tracing::info!(question = %answer.question, response = answer.response, "answer from ClientB")
        }
        _ => tracing::warn!("no answer from ClientB"),
    }

    a.shutdown();
    b.shutdown();
    Ok(())
}
