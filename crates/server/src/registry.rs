use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use submux_client::EmittedMessage;

/// Host-registered handler for one subscription's messages.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: EmittedMessage) -> anyhow::Result<()>;
}

/// Adapter for plain async functions and closures.
pub struct FnHandler<F>(F);

impl<F> FnHandler<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(EmittedMessage) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, message: EmittedMessage) -> anyhow::Result<()> {
        (self.0)(message).await
    }
}

/// Mapping of subscription name to handler. Populated at bootstrap, read-only
/// once handed to the server.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a subscription name. A second registration for
    /// the same name replaces the first.
    pub fn register(&mut self, subscription: impl Into<String>, handler: Arc<dyn MessageHandler>) {
        self.handlers.insert(subscription.into(), handler);
    }

    pub fn handler(&self, subscription: &str) -> Option<Arc<dyn MessageHandler>> {
        self.handlers.get(subscription).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
