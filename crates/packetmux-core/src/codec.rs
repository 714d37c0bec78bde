//! Pluggable payload serializers.
//!
//! A codec turns a JSON value into the string stored in an envelope's `data`
//! field and back. Typed conversion goes through `serde_json::Value` so the
//! trait stays object-safe and callers can pick a codec per send.

use serde_json::Value;

use crate::error::{MuxError, Result};
use crate::packet::Packet;

/// Payload serializer. Implementations must be inverse of each other:
/// `from_text(to_text(v)) == v`.
pub trait Codec: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;
    fn to_text(&self, value: &Value) -> Result<String>;
    fn from_text(&self, text: &str) -> Result<Value>;
}

/// serde_json backed codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        if self.pretty {
            "json-pretty"
        } else {
            "json"
        }
    }

    fn to_text(&self, value: &Value) -> Result<String> {
        let out = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        out.map_err(|e| MuxError::Codec(format!("json encode failed: {e}")))
    }

    fn from_text(&self, text: &str) -> Result<Value> {
        serde_json::from_str(text).map_err(|e| MuxError::Codec(format!("invalid payload json: {e}")))
    }
}

/// Serialize a packet body with `codec`.
pub fn encode_packet<P: Packet>(codec: &dyn Codec, packet: &P) -> Result<String> {
    let value = serde_json::to_value(packet)
        .map_err(|e| MuxError::Codec(format!("{} encode failed: {e}", P::TAG)))?;
    codec.to_text(&value)
}

/// Deserialize a packet body with `codec`.
pub fn decode_packet<P: Packet>(codec: &dyn Codec, data: &str) -> Result<P> {
    let value = codec.from_text(data)?;
    serde_json::from_value(value)
        .map_err(|e| MuxError::Codec(format!("{} decode failed: {e}", P::TAG)))
}
