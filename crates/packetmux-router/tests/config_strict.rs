#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use packetmux_router::config;
use packetmux_router::{Client, Expiry, MemoryBroker};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
client:
  name: "ClientA"
  reply_timeout: 3000 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert!(cfg.client.name.is_none());
    assert_eq!(cfg.reply_expiry(), Expiry::After(Duration::from_millis(5000)));
    assert!(!cfg.codec.pretty);
    assert!(!cfg.client_name().is_empty());
}

#[tokio::test]
async fn unnamed_clients_get_distinct_identities() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    let broker = Arc::new(MemoryBroker::new());
    let a = Client::start(&cfg, broker.clone()).unwrap();
    let b = Client::start(&cfg, broker.clone()).unwrap();

    assert_ne!(a.name(), b.name());
    assert_eq!(broker.subscriber_count(a.name()), 1);
    assert_eq!(broker.subscriber_count(b.name()), 1);
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
client:
  name: "ClientB"
  reply_timeout_ms: 0
codec:
  pretty: true
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.client_name(), "ClientB");
    assert_eq!(cfg.reply_expiry(), Expiry::Never);
    assert_eq!(cfg.default_codec().name(), "json-pretty");
}

#[test]
fn rejects_unknown_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn rejects_blank_name_and_huge_timeout() {
    let blank = "version: 1\nclient:\n  name: \"  \"\n";
    let err = config::load_from_str(blank).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");

    let huge = "version: 1\nclient:\n  reply_timeout_ms: 3600001\n";
    let err = config::load_from_str(huge).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}
