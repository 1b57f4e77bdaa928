//! # Transport Contract
//!
//! The narrow interface the correlation layer needs from a message bus.

use crate::message::{Delivery, RawMessage};
use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio_stream::Stream;

/// Errors from publishing to or reading from the bus.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The broker refused the message.
    #[error("broker rejected message on topic {topic}: {reason}")]
    Rejected { topic: String, reason: String },

    /// The publish call went out but no delivery acknowledgement came back.
    #[error("message on topic {topic} was not acknowledged: {reason}")]
    NotAcknowledged { topic: String, reason: String },

    /// The broker connection is closed.
    #[error("transport closed")]
    Closed,

    /// Joining the topic failed.
    #[error("failed to subscribe to topic {topic}: {reason}")]
    SubscribeFailed { topic: String, reason: String },

    /// The subscriber fell behind and the broker skipped messages.
    #[error("subscriber lagged, {0} messages skipped")]
    Lagged(u64),

    /// The message could not be encoded for the wire.
    #[error("failed to encode message: {0}")]
    Encode(String),
}

/// Stream of raw messages read from one topic.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<RawMessage, TransportError>> + Send>>;

/// A topic-based publish/subscribe bus.
///
/// Implementations must be safe for concurrent `publish` calls from many
/// tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish `payload` to `topic` and wait for the broker acknowledgement.
    ///
    /// The acknowledgement only proves the message left this process.
    async fn publish(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: Vec<u8>,
    ) -> Result<Delivery, TransportError>;

    /// Join `topic` and return the stream of messages published from now on.
    async fn subscribe(&self, topic: &str) -> Result<MessageStream, TransportError>;
}
