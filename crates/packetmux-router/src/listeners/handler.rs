use std::marker::PhantomData;
use std::sync::Arc;

use packetmux_core::{Codec, Packet, Received};

use crate::listeners::{ListenerKind, PacketListener};

/// Handler for fresh packets of one type (no correlation entry).
pub struct TypeHandler<P: Packet> {
    codec: Arc<dyn Codec>,
    callback: Box<dyn Fn(Received<P>) + Send + Sync>,
    _packet: PhantomData<fn() -> P>,
}

impl<P: Packet> TypeHandler<P> {
    pub fn new<F>(codec: Arc<dyn Codec>, callback: F) -> Self
    where
        F: Fn(Received<P>) + Send + Sync + 'static,
    {
        Self {
            codec,
            callback: Box::new(callback),
            _packet: PhantomData,
        }
    }
}

impl<P: Packet> PacketListener for TypeHandler<P> {
    type Packet = P;

    fn kind(&self) -> ListenerKind {
        ListenerKind::TypeHandler
    }

    fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    fn accept(&self, packet: Received<P>) {
        (self.callback)(packet)
    }
}
