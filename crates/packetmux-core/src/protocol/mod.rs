//! Protocol modules.
//!
//! - `envelope`: the JSON wire unit every packet travels in.
//! - `handshake`: control packets that open and close conversations.
//!
//! Decoding is panic-free: malformed input is reported as `MuxError::Codec`
//! and the receiving dispatcher drops the message.

pub mod envelope;
pub mod handshake;

pub use envelope::{decode, encode, Envelope};
pub use handshake::{ConversationEnd, ConversationStart};
