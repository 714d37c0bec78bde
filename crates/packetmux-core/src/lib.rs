//! packetmux core: transport-agnostic packet envelope, codecs, and errors.
//!
//! This crate defines the wire-level contracts and error surface shared by the
//! router and any transport adapter. It carries no runtime dependencies so it
//! can be reused by tooling that only needs to read or write envelopes.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed envelopes surface as `MuxError::Codec` so a receiving process
//! never crashes on bad traffic.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod codec;
pub mod error;
pub mod packet;
pub mod protocol;

/// Shared result type.
pub use error::{MuxError, Result};
pub use codec::{Codec, JsonCodec};
pub use packet::{Packet, Received};
