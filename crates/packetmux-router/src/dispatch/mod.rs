//! Inbound routing.
//!
//! `HandlerTable` maps type tags to handlers for fresh packets; `Dispatcher`
//! is the single entry point the client's pump task feeds every delivery
//! through.

pub mod dispatcher;
pub mod handlers;

pub use dispatcher::{Dispatcher, Route};
pub use handlers::HandlerTable;
