//! Top-level facade crate for packetmux.
//!
//! Re-exports the protocol primitives and the router so users can depend on a single crate.

pub mod core {
    pub use packetmux_core::*;
}

pub mod router {
    pub use packetmux_router::*;
}
