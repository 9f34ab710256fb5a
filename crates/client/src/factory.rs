use std::sync::Arc;

use submux_metadata::{BrokerConfig, BrokerType};

use crate::error::PubSubError;
use crate::memory::MemoryPubSub;
use crate::nats::NatsPubSub;
use crate::pubsub::PubSub;

/// Error creating a broker client
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("broker error: {0}")]
    Broker(#[from] PubSubError),
}

/// Factory for creating broker clients from configuration
pub struct PubSubFactory;

impl PubSubFactory {
    pub async fn create(
        project: &str,
        broker: &BrokerConfig,
    ) -> Result<Arc<dyn PubSub>, FactoryError> {
        match broker.broker_type {
            BrokerType::Memory => Ok(Arc::new(MemoryPubSub::new(project))),
            BrokerType::Nats => {
                let url = broker
                    .url
                    .as_deref()
                    .ok_or_else(|| FactoryError::ConfigError("nats broker requires a url".to_string()))?;
                let client = NatsPubSub::connect(url, project).await?;
                Ok(Arc::new(client))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_broker() {
        let config = BrokerConfig {
            broker_type: BrokerType::Memory,
            url: None,
        };
        let broker = PubSubFactory::create("acme-test", &config).await.unwrap();
        assert!(broker.subscriptions().is_empty());
    }

    #[tokio::test]
    async fn test_nats_without_url_rejected() {
        let config = BrokerConfig {
            broker_type: BrokerType::Nats,
            url: None,
        };
        let result = PubSubFactory::create("acme-test", &config).await;
        assert!(matches!(result, Err(FactoryError::ConfigError(_))));
    }
}
