//! # In-Memory Broker
//!
//! Single-process implementation of [`Transport`]. Every subscriber of a
//! topic sees every message published after it joined, in publish order.
//! Distributed deployments plug a real broker (e.g. Kafka) in behind the
//! same trait.

use crate::message::{Delivery, RawMessage};
use crate::subscriber::TopicStream;
use crate::transport::{MessageStream, Transport, TransportError};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Append-only view of one topic.
struct TopicLog {
    sender: broadcast::Sender<RawMessage>,
    /// Next offset to assign. Held while sending so offsets match send order.
    next_offset: Mutex<u64>,
}

/// In-memory topic broker backed by `tokio::sync::broadcast`.
pub struct InMemoryBroker {
    topics: RwLock<HashMap<String, Arc<TopicLog>>>,
    closed: AtomicBool,
    messages_published: AtomicU64,
    capacity: usize,
}

impl InMemoryBroker {
    /// Create a broker with the default per-subscriber buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a broker buffering `capacity` messages per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
            messages_published: AtomicU64::new(0),
            capacity,
        }
    }

    fn topic(&self, name: &str) -> Arc<TopicLog> {
        if let Some(log) = self.topics.read().get(name) {
            return log.clone();
        }

        self.topics
            .write()
            .entry(name.to_string())
            .or_insert_with(|| {
                let (sender, _) = broadcast::channel(self.capacity);
                Arc::new(TopicLog {
                    sender,
                    next_offset: Mutex::new(0),
                })
            })
            .clone()
    }

    /// Number of live subscriptions on `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .get(topic)
            .map_or(0, |log| log.sender.receiver_count())
    }

    /// Total messages acknowledged since creation.
    #[must_use]
    pub fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }

    /// Per-subscriber buffer size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Close the broker. Open streams end and later calls fail.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.topics.write().clear();
        debug!("In-memory broker closed");
    }

    /// Returns true once [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for InMemoryBroker {
    async fn publish(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: Vec<u8>,
    ) -> Result<Delivery, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let log = self.topic(topic);
        let offset = {
            let mut next_offset = log.next_offset.lock();
            let offset = *next_offset;
            *next_offset += 1;

            let message = RawMessage {
                topic: topic.to_string(),
                offset,
                key: key.map(<[u8]>::to_vec),
                payload,
            };

            // The message is committed once it has an offset; nobody
            // listening is not a delivery failure.
            match log.sender.send(message) {
                Ok(receivers) => {
                    debug!(topic, offset, receivers, "Message published");
                }
                Err(_) => {
                    debug!(topic, offset, "Message published with no active subscribers");
                }
            }
            offset
        };

        self.messages_published.fetch_add(1, Ordering::Relaxed);

        Ok(Delivery {
            topic: topic.to_string(),
            offset,
        })
    }

    async fn subscribe(&self, topic: &str) -> Result<MessageStream, TransportError> {
        if self.is_closed() {
            return Err(TransportError::SubscribeFailed {
                topic: topic.to_string(),
                reason: "broker closed".into(),
            });
        }

        let receiver = self.topic(topic).sender.subscribe();
        debug!(topic, "New subscription created");

        Ok(Box::pin(TopicStream::new(receiver, topic.to_string())))
    }
}
