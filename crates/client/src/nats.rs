//! NATS-backed broker.
//!
//! Core NATS only: no per-message acknowledgment, so `AckHandle` is a no-op
//! and `auto_ack` has no observable effect beyond the handle contract.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_nats::Client;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{DeliveryError, PubSubError};
use crate::message::{AckHandle, EmittedMessage};
use crate::options::ListenOptions;
use crate::pubsub::{MessageSink, PubSub};
use crate::subjects::SubjectBuilder;

struct ActiveSubscription {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

pub struct NatsPubSub {
    client: Client,
    subjects: SubjectBuilder,
    active: DashMap<String, ActiveSubscription>,
}

impl NatsPubSub {
    /// Create from an existing client, scoping subjects to `project`.
    pub fn new(client: Client, project: impl Into<String>) -> Self {
        Self {
            client,
            subjects: SubjectBuilder::new(project),
            active: DashMap::new(),
        }
    }

    /// Connect to a NATS server and create the broker.
    pub async fn connect(url: &str, project: &str) -> Result<Self, PubSubError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| PubSubError::ConnectionFailed(e.to_string()))?;
        info!(url = %url, project = %project, "Connected to NATS");
        Ok(Self::new(client, project))
    }
}

fn attributes_from_headers(headers: Option<&async_nats::HeaderMap>) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    if let Some(headers) = headers {
        for (name, values) in headers.iter() {
            if let Some(value) = values.first() {
                attributes.insert(name.to_string(), value.to_string());
            }
        }
    }
    attributes
}

#[async_trait]
impl PubSub for NatsPubSub {
    async fn listen(
        &self,
        subscription: &str,
        sink: Arc<dyn MessageSink>,
        options: ListenOptions,
    ) -> Result<(), PubSubError> {
        if self.active.contains_key(subscription) {
            return Err(PubSubError::AlreadyListening(subscription.to_string()));
        }

        let subject = self.subjects.subscription(subscription).to_string();
        let mut subscriber = match &options.queue_group {
            Some(queue_group) => self
                .client
                .queue_subscribe(subject.clone(), queue_group.clone())
                .await
                .map_err(|e| PubSubError::SubscribeFailed(e.to_string()))?,
            None => self
                .client
                .subscribe(subject.clone())
                .await
                .map_err(|e| PubSubError::SubscribeFailed(e.to_string()))?,
        };

        debug!(subscription = %subscription, subject = %subject, "Subscribed");

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let name = subscription.to_string();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    received = subscriber.next() => {
                        match received {
                            Some(msg) => {
                                let attributes = attributes_from_headers(msg.headers.as_ref());
                                let message = EmittedMessage::new(
                                    name.clone(),
                                    msg.payload,
                                    attributes,
                                    None,
                                    AckHandle::noop(),
                                );
                                sink.on_message(message).await;
                            }
                            None => {
                                // Stream ended without close(): connection lost
                                sink.on_error(DeliveryError::with_message(
                                    name.clone(),
                                    "subscription stream closed",
                                ));
                                break;
                            }
                        }
                    }
                }
            }
            let _ = subscriber.unsubscribe().await;
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
        let subject = self.subjects.subscription(topic).to_string();
        if attributes.is_empty() {
            self.client
                .publish(subject, payload)
                .await
                .map_err(|e| PubSubError::PublishFailed(e.to_string()))
        } else {
            let mut headers = async_nats::HeaderMap::new();
            for (k, v) in attributes {
                headers.insert(k, v);
            }
            self.client
                .publish_with_headers(subject, headers, payload)
                .await
                .map_err(|e| PubSubError::PublishFailed(e.to_string()))
        }
    }

    async fn request(
        &self,
        topic: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<EmittedMessage, PubSubError> {
        let subject = self.subjects.subscription(topic).to_string();
        let response = tokio::time::timeout(timeout, self.client.request(subject, payload))
            .await
            .map_err(|_| PubSubError::Timeout)?
            .map_err(|e| PubSubError::RequestFailed(e.to_string()))?;

        Ok(EmittedMessage::new(
            topic,
            response.payload,
            attributes_from_headers(response.headers.as_ref()),
            None,
            AckHandle::noop(),
        ))
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
