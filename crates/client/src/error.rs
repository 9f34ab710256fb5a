use std::fmt;

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PubSubError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),
    #[error("publish failed: {0}")]
    PublishFailed(String),
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("ack failed: {0}")]
    AckFailed(String),
    #[error("unknown subscription: {0}")]
    UnknownSubscription(String),
    #[error("already listening on subscription: {0}")]
    AlreadyListening(String),
    #[error("operation not supported by this broker: {0}")]
    Unsupported(&'static str),
    #[error("timeout")]
    Timeout,
}

/// Asynchronous delivery fault raised by a broker outside the processing of
/// any single message.
///
/// The `message` field is explicitly optional: faults that carry a
/// human-readable message are forwarded to the host's error hook, faults that
/// do not are only observable through logs.
#[derive(Debug, Clone)]
pub struct DeliveryError {
    pub subscription: String,
    pub message: Option<String>,
    /// Raw fault value as reported by the broker
    pub detail: Value,
}

impl DeliveryError {
    /// Wrap a standard error, capturing its message.
    pub fn from_error(subscription: impl Into<String>, error: &dyn std::error::Error) -> Self {
        let message = error.to_string();
        Self {
            subscription: subscription.into(),
            message: Some(message.clone()),
            detail: Value::String(message),
        }
    }

    /// Fault with a human-readable message.
    pub fn with_message(subscription: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            subscription: subscription.into(),
            message: Some(message.clone()),
            detail: Value::String(message),
        }
    }

    /// Fault carrying only an opaque value, with no message to forward.
    pub fn opaque(subscription: impl Into<String>, detail: Value) -> Self {
        Self {
            subscription: subscription.into(),
            message: None,
            detail,
        }
    }
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}", message),
            None => write!(f, "delivery fault on subscription {}", self.subscription),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_error_captures_message() {
        let io_error = std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout");
        let error = DeliveryError::from_error("orders", &io_error);
        assert_eq!(error.subscription, "orders");
        assert_eq!(error.message.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_opaque_has_no_message() {
        let error = DeliveryError::opaque("orders", json!({ "code": 503 }));
        assert_eq!(error.message, None);
        assert_eq!(error.detail, json!({ "code": 503 }));
    }
}
