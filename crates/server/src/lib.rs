//! submux-server: Inbound message dispatch bridge
//!
//! Bridges a host framework's start/stop lifecycle and handler registry to a
//! pub/sub broker: one listener per registered subscription, routing each
//! delivered message to its handler and funneling asynchronous delivery
//! faults into the host's logging and error hooks.

pub mod dispatch;
pub mod error;
pub mod registry;
pub mod reporter;
pub mod server;

pub use error::ServerError;
pub use registry::{FnHandler, HandlerRegistry, MessageHandler};
pub use reporter::{ErrorSink, NullErrorSink, Reporter};
pub use server::{PubSubServer, ServerOptions};
