use submux_client::PubSubError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("broker error: {0}")]
    Broker(#[from] PubSubError),
    #[error("operation not supported by this transport: {0}")]
    Unsupported(&'static str),
}
