use std::sync::Arc;

use submux_client::DeliveryError;
use tracing::error;

/// Host framework's lower-level error hook.
pub trait ErrorSink: Send + Sync {
    fn error(&self, message: &str);
}

/// Default sink for hosts without an error channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullErrorSink;

impl ErrorSink for NullErrorSink {
    fn error(&self, _message: &str) {}
}

/// Normalizes asynchronous delivery faults into the host's logging and error
/// contract.
///
/// Every fault is logged with a fixed description and the raw value. Only
/// faults carrying a message are forwarded to the sink; opaque faults are
/// observable through logs alone. Reporting never fails.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn ErrorSink>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn ErrorSink>) -> Self {
        Self { sink }
    }

    pub fn report(&self, error: &DeliveryError) {
        error!(
            subscription = %error.subscription,
            error = %error.detail,
            "an error occurred with the pub/sub server"
        );

        if let Some(message) = &error.message {
            self.sink.error(message);
        }
    }
}
