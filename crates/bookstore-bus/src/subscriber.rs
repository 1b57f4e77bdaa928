//! # Topic Subscriber
//!
//! Stream side of the in-memory broker.

use crate::message::RawMessage;
use crate::transport::TransportError;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;

/// Messages of one topic in publish order.
///
/// Ends (`None`) when the broker is closed. A subscriber that falls more
/// than the channel capacity behind receives `TransportError::Lagged` once
/// and then continues from the oldest retained message.
pub struct TopicStream {
    inner: BroadcastStream<RawMessage>,
    topic: String,
}

impl TopicStream {
    pub(crate) fn new(receiver: broadcast::Receiver<RawMessage>, topic: String) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
            topic,
        }
    }

    /// Topic this stream reads from.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl Stream for TopicStream {
    type Item = Result<RawMessage, TransportError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx).map(|next| {
            next.map(|item| {
                item.map_err(|e| match e {
                    BroadcastStreamRecvError::Lagged(skipped) => TransportError::Lagged(skipped),
                })
            })
        })
    }
}
