//! submux-client: Pub/sub broker abstractions
//!
//! Provides a trait-based seam over pub/sub brokers (`PubSub` + `MessageSink`)
//! with a NATS implementation and an in-memory broker for hermetic tests.

pub mod error;
pub mod factory;
pub mod memory;
pub mod message;
pub mod nats;
pub mod options;
pub mod pubsub;
pub mod subjects;

pub use error::{DeliveryError, PubSubError};
pub use factory::{FactoryError, PubSubFactory};
pub use memory::{AckState, MemoryPubSub};
pub use message::{AckHandle, Acker, EmittedMessage};
pub use nats::NatsPubSub;
pub use options::ListenOptions;
pub use pubsub::{MessageSink, PubSub};
pub use subjects::{sanitize_subject_token, SubjectBuilder};
