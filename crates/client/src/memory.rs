//! In-memory broker for hermetic tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::error::{DeliveryError, PubSubError};
use crate::message::{AckHandle, Acker, EmittedMessage};
use crate::options::ListenOptions;
use crate::pubsub::{MessageSink, PubSub};
use crate::subjects::SubjectBuilder;

const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Recorded acknowledgment outcome, keyed by message sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckState {
    Acked,
    Nacked,
}

#[derive(Debug, Clone)]
struct Delivery {
    payload: Bytes,
    attributes: HashMap<String, String>,
    sequence: u64,
}

struct ActiveSubscription {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// In-process pub/sub broker backed by broadcast channels. Subscriptions bind
/// to the topic of the same name.
pub struct MemoryPubSub {
    subjects: SubjectBuilder,
    channels: DashMap<String, broadcast::Sender<Delivery>>,
    active: DashMap<String, ActiveSubscription>,
    sequence: AtomicU64,
    acks: Arc<DashMap<u64, AckState>>,
}

impl MemoryPubSub {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            subjects: SubjectBuilder::new(project),
            channels: DashMap::new(),
            active: DashMap::new(),
            sequence: AtomicU64::new(0),
            acks: Arc::new(DashMap::new()),
        }
    }

    /// Acknowledgment outcome recorded for a delivered message, if any.
    pub fn ack_state(&self, sequence: u64) -> Option<AckState> {
        self.acks.get(&sequence).map(|entry| *entry.value())
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    fn get_or_create_channel(&self, subject: &str) -> broadcast::Sender<Delivery> {
        self.channels
            .entry(subject.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_BUFFER_SIZE).0)
            .clone()
    }
}

struct MemoryAcker {
    acks: Arc<DashMap<u64, AckState>>,
    sequence: u64,
}

#[async_trait]
impl Acker for MemoryAcker {
    async fn ack(&self) -> Result<(), PubSubError> {
        self.acks.insert(self.sequence, AckState::Acked);
        Ok(())
    }

    async fn nack(&self) -> Result<(), PubSubError> {
        self.acks.insert(self.sequence, AckState::Nacked);
        Ok(())
    }
}

#[async_trait]
impl PubSub for MemoryPubSub {
    async fn listen(
        &self,
        subscription: &str,
        sink: Arc<dyn MessageSink>,
        options: ListenOptions,
    ) -> Result<(), PubSubError> {
        if self.active.contains_key(subscription) {
            return Err(PubSubError::AlreadyListening(subscription.to_string()));
        }

        let subject = self.subjects.subscription(subscription);
        let mut rx = self.get_or_create_channel(&subject).subscribe();
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let name = subscription.to_string();
        let acks = Arc::clone(&self.acks);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    received = rx.recv() => {
                        match received {
                            Ok(delivery) => {
                                let ack = AckHandle::new(Arc::new(MemoryAcker {
                                    acks: Arc::clone(&acks),
                                    sequence: delivery.sequence,
                                }));
                                let message = EmittedMessage::new(
                                    name.clone(),
                                    delivery.payload,
                                    delivery.attributes,
                                    Some(delivery.sequence),
                                    ack,
                                );
                                if options.auto_ack {
                                    let _ = message.ack().await;
                                }
                                // Awaited: one in-flight message per subscription
                                sink.on_message(message).await;
                            }
                            Err(broadcast::error::RecvError::Lagged(_)) => {
                                let error = DeliveryError::with_message(
                                    name.clone(),
                                    "subscription lagged, messages dropped",
                                );
                                sink.on_error(error);
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
        });

        self.active.insert(
            subscription.to_string(),
            ActiveSubscription {
                shutdown: shutdown_tx,
                task,
            },
        );

        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        payload: Bytes,
        attributes: HashMap<String, String>,
    ) -> Result<(), PubSubError> {
        let subject = self.subjects.subscription(topic);
        let tx = self.get_or_create_channel(&subject);
        let delivery = Delivery {
            payload,
            attributes,
            sequence: self.next_sequence(),
        };
        // No receivers is fine: the message is simply dropped
        let _ = tx.send(delivery);
        Ok(())
    }

    async fn request(
        &self,
        _topic: &str,
        _payload: Bytes,
        _timeout: Duration,
    ) -> Result<EmittedMessage, PubSubError> {
        Err(PubSubError::Unsupported("request"))
    }

    fn subscriptions(&self) -> Vec<String> {
        self.active.iter().map(|entry| entry.key().clone()).collect()
    }

    async fn close(&self, subscription: &str) -> Result<(), PubSubError> {
        let (_, sub) = self
            .active
            .remove(subscription)
            .ok_or_else(|| PubSubError::UnknownSubscription(subscription.to_string()))?;
        let _ = sub.shutdown.send(true);
        let _ = sub.task.await;
        Ok(())
    }
}
