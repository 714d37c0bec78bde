//! Registry, type table, and inbound routing without a running client.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use packetmux_core::protocol::envelope;
use packetmux_core::{Codec, JsonCodec};
use packetmux_router::dispatch::{Dispatcher, HandlerTable, Route};
use packetmux_router::listeners::{Listener, ListenerKind, ListenerRegistry, TypeHandler};
use packetmux_router::transport::Delivery;
use packetmux_router::MemoryBroker;

mod common;
use common::{MathQuestion, Ping};

struct Fixture {
    broker: Arc<MemoryBroker>,
    registry: Arc<ListenerRegistry>,
    handlers: Arc<HandlerTable>,
    dispatcher: Dispatcher,
    _inbox: mpsc::UnboundedReceiver<Delivery>,
}

fn fixture() -> Fixture {
    let broker = Arc::new(MemoryBroker::new());
    let (tx, rx) = mpsc::unbounded_channel();
    let registry = Arc::new(ListenerRegistry::new(broker.clone(), tx));
    let handlers = Arc::new(HandlerTable::new());
    let dispatcher = Dispatcher::new(registry.clone(), handlers.clone());
    Fixture {
        broker,
        registry,
        handlers,
        dispatcher,
        _inbox: rx,
    }
}

fn codec() -> Arc<dyn Codec> {
    Arc::new(JsonCodec::compact())
}

fn counting_handler(count: &Arc<AtomicUsize>) -> Arc<dyn Listener> {
    let count = count.clone();
    Arc::new(TypeHandler::<MathQuestion>::new(codec(), move |_| {
        count.fetch_add(1, Ordering::SeqCst);
    }))
}

fn frame(id: &str) -> Vec<u8> {
    envelope::encode(&JsonCodec::compact(), &MathQuestion::new("2+2", 0), id, "ClientB")
        .unwrap()
        .to_vec()
}

#[test]
fn correlated_envelope_never_reaches_type_handler() {
    let f = fixture();
    let by_type = Arc::new(AtomicUsize::new(0));
    let by_id = Arc::new(AtomicUsize::new(0));

    f.handlers.register("MathQuestionPacket", counting_handler(&by_type)).unwrap();
    f.registry.register("req-1", counting_handler(&by_id), false).unwrap();

    assert_eq!(f.dispatcher.on_message("ClientA", &frame("req-1")).unwrap(), Route::Correlated);
    assert_eq!(by_id.load(Ordering::SeqCst), 1);
    assert_eq!(by_type.load(Ordering::SeqCst), 0);

    assert_eq!(f.dispatcher.on_message("ClientA", &frame("fresh-1")).unwrap(), Route::Fresh);
    assert_eq!(by_id.load(Ordering::SeqCst), 1);
    assert_eq!(by_type.load(Ordering::SeqCst), 1);
}

#[test]
fn unknown_type_is_dropped_silently() {
    let f = fixture();
    let raw = envelope::encode(&JsonCodec::compact(), &Ping { n: 1 }, "p-1", "ClientB").unwrap();
    assert_eq!(f.dispatcher.on_message("ClientA", &raw).unwrap(), Route::Dropped);
}

#[test]
fn malformed_input_is_a_codec_error() {
    let f = fixture();
    let by_type = Arc::new(AtomicUsize::new(0));
    f.handlers.register("MathQuestionPacket", counting_handler(&by_type)).unwrap();

    let err = f.dispatcher.on_message("ClientA", b"not json").expect_err("must fail");
    assert_eq!(err.code().as_str(), "CODEC");

    // envelope is fine, payload does not fit the handler's type
    let raw = br#"{"id":"x","source":"ClientB","data":"{\"question\":1}","clazz":"MathQuestionPacket"}"#;
    let err = f.dispatcher.on_message("ClientA", raw).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CODEC");
    assert_eq!(by_type.load(Ordering::SeqCst), 0);
}

#[test]
fn second_type_handler_is_rejected_and_first_stays() {
    let f = fixture();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    f.handlers.register("MathQuestionPacket", counting_handler(&first)).unwrap();
    let err = f
        .handlers
        .register("MathQuestionPacket", counting_handler(&second))
        .expect_err("duplicate must fail");
    assert_eq!(err.code().as_str(), "DUPLICATE_HANDLER");

    f.dispatcher.on_message("ClientA", &frame("fresh")).unwrap();
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
    assert_eq!(f.handlers.registered_types(), vec!["MathQuestionPacket".to_string()]);
}

#[test]
fn registry_subscribes_only_when_asked() {
    let f = fixture();
    let count = Arc::new(AtomicUsize::new(0));

    f.registry.register("math", counting_handler(&count), true).unwrap();
    f.registry.register("req-9", counting_handler(&count), false).unwrap();

    assert_eq!(f.broker.subscriber_count("math"), 1);
    assert_eq!(f.broker.subscriber_count("req-9"), 0);
    assert_eq!(f.registry.len(), 2);
}

#[test]
fn unregister_is_idempotent_and_kind_checked() {
    let f = fixture();
    let count = Arc::new(AtomicUsize::new(0));
    f.registry.register("k", counting_handler(&count), false).unwrap();

    assert!(!f.registry.unregister_kind("k", ListenerKind::Conversation));
    assert!(f.registry.contains("k"));

    assert!(f.registry.unregister("k"));
    assert!(!f.registry.unregister("k"));
    assert!(f.registry.lookup("k").is_none());
}

#[test]
fn last_registration_wins() {
    let f = fixture();
    let old = Arc::new(AtomicUsize::new(0));
    let new = Arc::new(AtomicUsize::new(0));

    f.registry.register("k", counting_handler(&old), false).unwrap();
    f.registry.register("k", counting_handler(&new), false).unwrap();

    f.dispatcher.on_message("ClientA", &frame("k")).unwrap();
    assert_eq!(old.load(Ordering::SeqCst), 0);
    assert_eq!(new.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_registration_keeps_every_key() {
    let f = fixture();
    let count = Arc::new(AtomicUsize::new(0));

    std::thread::scope(|s| {
        for t in 0..8 {
            let registry = &f.registry;
            let count = &count;
            s.spawn(move || {
                for i in 0..100 {
                    let key = format!("{t}-{i}");
                    registry.register(key.clone(), counting_handler(count), false).unwrap();
                    if i % 2 == 0 {
                        registry.unregister(&key);
                    }
                }
            });
        }
    });

    assert_eq!(f.registry.len(), 8 * 50);
}
