use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::PubSubError;

/// Acknowledgment capability attached to a delivered message.
#[async_trait]
pub trait Acker: Send + Sync {
    async fn ack(&self) -> Result<(), PubSubError>;
    async fn nack(&self) -> Result<(), PubSubError>;
}

#[derive(Clone)]
pub struct AckHandle(Arc<dyn Acker>);

impl AckHandle {
    pub fn new(acker: Arc<dyn Acker>) -> Self {
        Self(acker)
    }

    /// Handle for brokers without per-message acknowledgment (core NATS).
    pub fn noop() -> Self {
        Self(Arc::new(NoopAcker))
    }

    pub async fn ack(&self) -> Result<(), PubSubError> {
        self.0.ack().await
    }

    pub async fn nack(&self) -> Result<(), PubSubError> {
        self.0.nack().await
    }
}

impl fmt::Debug for AckHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AckHandle")
    }
}

struct NoopAcker;

#[async_trait]
impl Acker for NoopAcker {
    async fn ack(&self) -> Result<(), PubSubError> {
        Ok(())
    }

    async fn nack(&self) -> Result<(), PubSubError> {
        Ok(())
    }
}

/// Message envelope delivered to a subscription listener.
///
/// The payload is opaque to the dispatch layer; routing happens on the
/// subscription name alone.
#[derive(Debug, Clone)]
pub struct EmittedMessage {
    pub id: String,
    pub subscription: String,
    pub payload: Bytes,
    pub attributes: HashMap<String, String>,
    pub sequence: Option<u64>,
    /// Delivery timestamp, milliseconds since the Unix epoch
    pub received_at: u64,
    ack: AckHandle,
}

impl EmittedMessage {
    pub fn new(
        subscription: impl Into<String>,
        payload: Bytes,
        attributes: HashMap<String, String>,
        sequence: Option<u64>,
        ack: AckHandle,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            subscription: subscription.into(),
            payload,
            attributes,
            sequence,
            received_at: epoch_millis(),
            ack,
        }
    }

    pub async fn ack(&self) -> Result<(), PubSubError> {
        self.ack.ack().await
    }

    pub async fn nack(&self) -> Result<(), PubSubError> {
        self.ack.nack().await
    }
}

pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
