use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::MetadataError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BrokerType {
    Nats,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(rename = "type")]
    pub broker_type: BrokerType,
    /// Broker URL (e.g., "nats://localhost:4222"). Unused for the in-memory broker.
    pub url: Option<String>,
}

/// Per-subscription listen tuning supplied by the host. Every field is
/// optional; unset fields fall back to the client's defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ListenOverrides {
    /// Acknowledge messages on receipt instead of leaving ack/nack to the handler
    #[serde(default)]
    pub auto_ack: Option<bool>,
    /// NATS queue group for load-balanced delivery
    #[serde(default)]
    pub queue_group: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    /// Project identifier, used as the subject namespace prefix
    pub project: String,
    pub broker: BrokerConfig,
    /// Allow-list of subscriptions to activate; all registered subscriptions
    /// are activated when absent
    #[serde(default)]
    pub subscriptions: Option<Vec<String>>,
    #[serde(default)]
    pub listen: ListenOverrides,
}

impl ServiceConfig {
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let content = std::fs::read_to_string(path)?;
        let config: ServiceConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), MetadataError> {
        if self.project.is_empty() {
            return Err(MetadataError::Validation("project must not be empty".to_string()));
        }
        if self.broker.broker_type == BrokerType::Nats && self.broker.url.is_none() {
            return Err(MetadataError::Validation(
                "nats broker requires a url".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_service_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
name: orders-service
project: acme-dev
broker:
  type: memory
subscriptions:
  - orders
  - shipping
listen:
  auto_ack: false
"#
        )
        .unwrap();

        let config = ServiceConfig::load(file.path()).unwrap();
        assert_eq!(config.name, "orders-service");
        assert_eq!(config.project, "acme-dev");
        assert_eq!(config.broker.broker_type, BrokerType::Memory);
        assert_eq!(
            config.subscriptions,
            Some(vec!["orders".to_string(), "shipping".to_string()])
        );
        assert_eq!(config.listen.auto_ack, Some(false));
        assert_eq!(config.listen.queue_group, None);
    }

    #[test]
    fn test_load_without_allow_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
name: orders-service
project: acme-dev
broker:
  type: nats
  url: nats://localhost:4222
"#
        )
        .unwrap();

        let config = ServiceConfig::load(file.path()).unwrap();
        assert_eq!(config.subscriptions, None);
        assert_eq!(config.listen, ListenOverrides::default());
        assert_eq!(config.broker.url.as_deref(), Some("nats://localhost:4222"));
    }

    #[test]
    fn test_nats_broker_requires_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
name: orders-service
project: acme-dev
broker:
  type: nats
"#
        )
        .unwrap();

        let result = ServiceConfig::load(file.path());
        assert!(matches!(result, Err(MetadataError::Validation(_))));
    }

    #[test]
    fn test_empty_project_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
name: orders-service
project: ""
broker:
  type: memory
"#
        )
        .unwrap();

        let result = ServiceConfig::load(file.path());
        assert!(matches!(result, Err(MetadataError::Validation(_))));
    }
}
