use serde::{Deserialize, Serialize};
use submux_metadata::ListenOverrides;

/// Options applied when registering a subscription listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenOptions {
    /// Acknowledge each message on receipt, before the sink runs. When false,
    /// ack/nack is left to the handler through the message's `AckHandle`.
    #[serde(default = "default_auto_ack")]
    pub auto_ack: bool,
    /// NATS queue group for load-balanced delivery; ignored by brokers
    /// without queue semantics
    #[serde(default)]
    pub queue_group: Option<String>,
}

fn default_auto_ack() -> bool {
    true
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            auto_ack: default_auto_ack(),
            queue_group: None,
        }
    }
}

impl ListenOptions {
    /// Merge caller overrides on top of the defaults. Explicit overrides win.
    pub fn merged(overrides: &ListenOverrides) -> Self {
        let defaults = Self::default();
        Self {
            auto_ack: overrides.auto_ack.unwrap_or(defaults.auto_ack),
            queue_group: overrides.queue_group.clone().or(defaults.queue_group),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ListenOptions::default();
        assert!(options.auto_ack);
        assert_eq!(options.queue_group, None);
    }

    #[test]
    fn test_merged_empty_overrides_keeps_defaults() {
        let options = ListenOptions::merged(&ListenOverrides::default());
        assert_eq!(options, ListenOptions::default());
    }

    #[test]
    fn test_merged_explicit_overrides_win() {
        let overrides = ListenOverrides {
            auto_ack: Some(false),
            queue_group: Some("workers".to_string()),
        };
        let options = ListenOptions::merged(&overrides);
        assert!(!options.auto_ack);
        assert_eq!(options.queue_group.as_deref(), Some("workers"));
    }

    #[test]
    fn test_merged_partial_overrides() {
        let overrides = ListenOverrides {
            auto_ack: None,
            queue_group: Some("workers".to_string()),
        };
        let options = ListenOptions::merged(&overrides);
        assert!(options.auto_ack);
        assert_eq!(options.queue_group.as_deref(), Some("workers"));
    }
}
