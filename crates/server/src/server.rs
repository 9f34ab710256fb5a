use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use futures_util::future::join_all;
use submux_client::{ListenOptions, MessageSink, PubSub};
use submux_metadata::ListenOverrides;
use tracing::{debug, warn};

use crate::dispatch::Dispatch;
use crate::error::ServerError;
use crate::registry::HandlerRegistry;
use crate::reporter::{ErrorSink, NullErrorSink, Reporter};

/// Construction-time configuration, immutable thereafter.
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Allow-list of subscriptions to activate. Subset filter only: names not
    /// present in the registry are never activated. All registered
    /// subscriptions are activated when absent.
    pub subscriptions: Option<Vec<String>>,
    /// Listen tuning merged over client defaults
    pub listen: ListenOverrides,
}

impl ServerOptions {
    fn allows(&self, subscription: &str) -> bool {
        match &self.subscriptions {
            None => true,
            Some(allow) => allow.iter().any(|name| name == subscription),
        }
    }
}

/// Bridges the host's start/stop lifecycle to a broker's listen/close
/// operations.
///
/// `serve` and `close` are expected to be called by a single owner in a
/// non-overlapping start-once-then-stop-once lifecycle; concurrent calls have
/// undefined effect.
pub struct PubSubServer {
    client: Arc<dyn PubSub>,
    registry: Arc<HandlerRegistry>,
    options: ServerOptions,
    dispatch: Arc<Dispatch>,
    in_flight: Arc<DashMap<String, Arc<AtomicU64>>>,
}

impl PubSubServer {
    pub fn new(client: Arc<dyn PubSub>, registry: HandlerRegistry, options: ServerOptions) -> Self {
        Self::with_error_sink(client, registry, options, Arc::new(NullErrorSink))
    }

    pub fn with_error_sink(
        client: Arc<dyn PubSub>,
        registry: HandlerRegistry,
        options: ServerOptions,
        error_sink: Arc<dyn ErrorSink>,
    ) -> Self {
        let registry = Arc::new(registry);
        let in_flight = Arc::new(DashMap::new());
        let dispatch = Arc::new(Dispatch::new(
            Arc::clone(&registry),
            Reporter::new(error_sink),
            Arc::clone(&in_flight),
        ));
        Self {
            client,
            registry,
            options,
            dispatch,
            in_flight,
        }
    }

    /// Messages currently being handled on a subscription (0 or 1: delivery
    /// is sequential per subscription).
    pub fn in_flight(&self, subscription: &str) -> u64 {
        self.in_flight
            .get(subscription)
            .map(|gauge| gauge.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Begin listening on every registered subscription not excluded by the
    /// allow-list.
    ///
    /// Listen requests are issued concurrently and joined after all have
    /// settled. Returns the activated subscription names when every request
    /// succeeded, or the first error otherwise. Subscriptions that registered
    /// before a failure are not rolled back; callers may `close` to tear them
    /// down.
    pub async fn serve(&self) -> Result<Vec<String>, ServerError> {
        if let Some(allow) = &self.options.subscriptions {
            for name in allow {
                if self.registry.handler(name).is_none() {
                    warn!(
                        subscription = %name,
                        "allow-listed subscription has no registered handler"
                    );
                }
            }
        }

        let listen_options = ListenOptions::merged(&self.options.listen);
        let mut activated = Vec::new();
        let mut pending = Vec::new();

        for name in self.registry.names() {
            if !self.options.allows(name) {
                continue;
            }
            debug!(subscription = %name, "registering subscription");
            activated.push(name.to_string());

            let client = Arc::clone(&self.client);
            let sink = Arc::clone(&self.dispatch) as Arc<dyn MessageSink>;
            let options = listen_options.clone();
            let name = name.to_string();
            pending.push(async move { client.listen(&name, sink, options).await });
        }

        for result in join_all(pending).await {
            result?;
        }
        Ok(activated)
    }

    /// Close every active subscription, one at a time, each fully awaited.
    ///
    /// No timeout is imposed; callers wanting bounded shutdown should wrap
    /// this in `tokio::time::timeout`.
    pub async fn close(&self) -> Result<(), ServerError> {
        for name in self.client.subscriptions() {
            debug!(subscription = %name, "closing subscription");
            self.client.close(&name).await?;
        }
        Ok(())
    }

    /// Outbound request/reply dispatch. Not supported by this transport;
    /// always fails with a checkable error so callers relying on
    /// request/response semantics discover the gap immediately.
    pub async fn send(&self, _topic: &str, _payload: Bytes) -> Result<(), ServerError> {
        Err(ServerError::Unsupported("request-reply dispatch"))
    }
}
