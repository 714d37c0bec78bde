//! Wire envelope (JSON).
//!
//! The payload is serialized by the sender's codec into `data`, so on the
//! wire the body is a JSON string inside a JSON object (double encoding).
//! The envelope itself is always compact serde_json regardless of codec.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::codec::{decode_packet, encode_packet, Codec};
use crate::error::{MuxError, Result};
use crate::packet::{Packet, Received};

/// Wire envelope: exactly four string fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    /// Correlation key.
    pub id: String,
    /// Sender identity.
    pub source: String,
    /// Serialized payload.
    pub data: String,
    /// Payload type tag (field name is `clazz` in JSON).
    #[serde(rename = "clazz")]
    pub type_tag: String,
}

impl Envelope {
    /// Serialize `packet` with `codec` and wrap it.
    pub fn seal<P: Packet>(codec: &dyn Codec, packet: &P, id: &str, source: &str) -> Result<Self> {
        Ok(Self {
            id: id.to_owned(),
            source: source.to_owned(),
            data: encode_packet(codec, packet)?,
            type_tag: P::TAG.to_owned(),
        })
    }

    /// Decode the payload as `P` and attach the header fields.
    ///
    /// The type tag is not checked: correlated replies are decoded as whatever
    /// type the waiting listener declared.
    pub fn open<P: Packet>(&self, codec: &dyn Codec) -> Result<Received<P>> {
        let packet = decode_packet::<P>(codec, &self.data)?;
        Ok(Received {
            id: self.id.clone(),
            source: self.source.clone(),
            packet,
        })
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|e| MuxError::Codec(format!("envelope encode failed: {e}")))
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw)
            .map_err(|e| MuxError::Codec(format!("invalid envelope json: {e}")))
    }
}

/// Frame `packet` into wire bytes.
pub fn encode<P: Packet>(codec: &dyn Codec, packet: &P, id: &str, source: &str) -> Result<Bytes> {
    Envelope::seal(codec, packet, id, source)?.to_bytes()
}

/// Parse wire bytes into an envelope. Unknown type tags are not rejected here.
pub fn decode(raw: &[u8]) -> Result<Envelope> {
    Envelope::from_slice(raw)
}
