//! Integration tests for the NATS broker
//!
//! Run with: cargo test -p submux-client --test nats_integration -- --ignored
//! Requires: docker run -p 4222:4222 nats:latest

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use submux_client::{
    DeliveryError, EmittedMessage, ListenOptions, MessageSink, NatsPubSub, PubSub,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

struct ChannelSink {
    tx: mpsc::UnboundedSender<EmittedMessage>,
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn on_message(&self, message: EmittedMessage) {
        let _ = self.tx.send(message);
    }

    fn on_error(&self, _error: DeliveryError) {}
}

#[tokio::test]
#[ignore]
async fn test_nats_listen_publish_roundtrip() {
    let broker = NatsPubSub::connect("nats://localhost:4222", "submux-test")
        .await
        .expect("Failed to connect to NATS");

    let (tx, mut rx) = mpsc::unbounded_channel();
    broker
        .listen("orders", Arc::new(ChannelSink { tx }), ListenOptions::default())
        .await
        .expect("Failed to listen");

    broker
        .publish("orders", Bytes::from("test message"), HashMap::new())
        .await
        .expect("Failed to publish");

    let msg = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("Timed out waiting for message")
        .expect("Sink channel closed");
    assert_eq!(msg.subscription, "orders");
    assert_eq!(msg.payload, Bytes::from("test message"));

    broker.close("orders").await.expect("Failed to close");
    assert!(broker.subscriptions().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_nats_attributes_roundtrip() {
    let broker = NatsPubSub::connect("nats://localhost:4222", "submux-test")
        .await
        .expect("Failed to connect to NATS");

    let (tx, mut rx) = mpsc::unbounded_channel();
    broker
        .listen("shipping", Arc::new(ChannelSink { tx }), ListenOptions::default())
        .await
        .expect("Failed to listen");

    let mut attributes = HashMap::new();
    attributes.insert("trace-id".to_string(), "abc123".to_string());
    broker
        .publish("shipping", Bytes::from("x"), attributes)
        .await
        .expect("Failed to publish");

    let msg = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("Timed out waiting for message")
        .expect("Sink channel closed");
    assert_eq!(msg.attributes.get("trace-id").map(String::as_str), Some("abc123"));

    broker.close("shipping").await.expect("Failed to close");
}
