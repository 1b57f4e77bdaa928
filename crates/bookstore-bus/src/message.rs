//! # Raw Messages
//!
//! What the broker stores and hands out. Payloads are opaque bytes here.

/// A message as read from a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Topic the message was published on.
    pub topic: String,
    /// Position of the message in the topic log.
    pub offset: u64,
    /// Optional partitioning key.
    pub key: Option<Vec<u8>>,
    /// Encoded payload.
    pub payload: Vec<u8>,
}

/// Broker acknowledgement for a published message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Topic the message was committed to.
    pub topic: String,
    /// Offset assigned by the broker.
    pub offset: u64,
}
