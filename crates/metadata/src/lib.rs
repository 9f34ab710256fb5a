//! submux-metadata: Shared configuration types for the submux dispatch bridge

pub mod config;
pub mod error;

pub use config::{BrokerConfig, BrokerType, ListenOverrides, ServiceConfig};
pub use error::MetadataError;
