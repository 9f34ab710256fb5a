use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{DeliveryError, PubSubError};
use crate::message::EmittedMessage;
use crate::options::ListenOptions;

/// Receiver side of a subscription listener.
///
/// `on_message` is awaited before the next message on the same subscription is
/// pulled, so one sink invocation is in flight per subscription at a time.
/// Messages on different subscriptions interleave freely.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn on_message(&self, message: EmittedMessage);

    /// Asynchronous delivery fault, outside the processing of any message.
    fn on_error(&self, error: DeliveryError);
}

/// Pub/sub broker abstraction.
#[async_trait]
pub trait PubSub: Send + Sync {
    /// Begin listening on a named subscription, delivering into `sink`.
    async fn listen(
        &self,
        subscription: &str,
        sink: Arc<dyn MessageSink>,
        options: ListenOptions,
    ) -> Result<(), PubSubError>;

    /// Publish a message to a topic (fire and forget).
    async fn publish(
        &self,
        topic: &str,
        payload: Bytes,
        attributes: HashMap<String, String>,
    ) -> Result<(), PubSubError>;

    /// Request/reply with timeout. Brokers without reply semantics return
    /// `PubSubError::Unsupported`.
    async fn request(
        &self,
        topic: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<EmittedMessage, PubSubError>;

    /// Names of currently active subscriptions, for shutdown iteration.
    fn subscriptions(&self) -> Vec<String>;

    /// Stop listening on a subscription, waiting for its pump to finish.
    async fn close(&self, subscription: &str) -> Result<(), PubSubError>;
}
