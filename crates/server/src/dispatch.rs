use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use submux_client::{DeliveryError, EmittedMessage, MessageSink};
use tracing::{error, warn};

use crate::registry::HandlerRegistry;
use crate::reporter::Reporter;

/// Routes delivered messages to registered handlers and delivery faults to
/// the reporter. One instance is shared across every subscription listener.
pub(crate) struct Dispatch {
    registry: Arc<HandlerRegistry>,
    reporter: Reporter,
    in_flight: Arc<DashMap<String, Arc<AtomicU64>>>,
}

impl Dispatch {
    pub(crate) fn new(
        registry: Arc<HandlerRegistry>,
        reporter: Reporter,
        in_flight: Arc<DashMap<String, Arc<AtomicU64>>>,
    ) -> Self {
        Self {
            registry,
            reporter,
            in_flight,
        }
    }

    fn gauge(&self, subscription: &str) -> Arc<AtomicU64> {
        let entry = self
            .in_flight
            .entry(subscription.to_string())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)));
        Arc::clone(entry.value())
    }
}

#[async_trait]
impl MessageSink for Dispatch {
    async fn on_message(&self, message: EmittedMessage) {
        let Some(handler) = self.registry.handler(&message.subscription) else {
            // Non-fatal, but surfaced: a silent drop would mask misconfiguration
            warn!(
                subscription = %message.subscription,
                "no handler registered for subscription, dropping message"
            );
            return;
        };

        let subscription = message.subscription.clone();
        let gauge = self.gauge(&subscription);
        gauge.fetch_add(1, Ordering::SeqCst);
        let result = handler.handle(message).await;
        gauge.fetch_sub(1, Ordering::SeqCst);

        if let Err(err) = result {
            error!(subscription = %subscription, error = %err, "message handler failed");
        }
    }

    fn on_error(&self, error: DeliveryError) {
        self.reporter.report(&error);
    }
}
