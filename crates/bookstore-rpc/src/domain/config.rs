//! Correlation layer configuration with validation.

use bookstore_bus::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_TOPIC};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default deadline for one outbound call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of concurrently processed inbound requests.
pub const DEFAULT_WORKER_POOL_SIZE: usize = 10;

/// Default number of decoded requests waiting for a worker slot.
pub const DEFAULT_REQUEST_BACKLOG: usize = 64;

/// Settings shared by the Call Façade and the Inbound Dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Topic carrying both requests and responses.
    pub topic: String,
    /// Deadline applied by `invoke_default` and the typed helpers.
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,
    /// Max request handlers running at once.
    pub worker_pool_size: usize,
    /// Requests admitted but waiting for a worker slot. When full, the
    /// dispatcher stops reading the bus.
    pub request_backlog: usize,
    /// Per-subscriber buffer of the in-memory broker.
    pub channel_capacity: usize,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            request_backlog: DEFAULT_REQUEST_BACKLOG,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl RpcConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topic.trim().is_empty() {
            return Err(ConfigError::InvalidTopic("topic cannot be empty".into()));
        }

        if self.call_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "call_timeout cannot be 0".into(),
            ));
        }

        if self.worker_pool_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "worker_pool_size cannot be 0".into(),
            ));
        }

        if self.request_backlog == 0 {
            return Err(ConfigError::InvalidLimit(
                "request_backlog cannot be 0".into(),
            ));
        }

        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidLimit(
                "channel_capacity cannot be 0".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Missing or blank topic
    #[error("invalid topic: {0}")]
    InvalidTopic(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
}
