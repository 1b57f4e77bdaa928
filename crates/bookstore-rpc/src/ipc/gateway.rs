//! Outbound Gateway - the one way out to the bus.
//!
//! Used by the Call Façade for requests and by request workers for
//! responses. Messages are keyed by call id so a partitioned broker keeps a
//! call's request and response together.

use crate::domain::envelope::{self, Envelope};
use bookstore_bus::{Delivery, Transport, TransportError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Publishes encoded envelopes to one topic.
#[derive(Clone)]
pub struct OutboundGateway {
    transport: Arc<dyn Transport>,
    topic: String,
}

impl OutboundGateway {
    pub fn new(transport: Arc<dyn Transport>, topic: impl Into<String>) -> Self {
        Self {
            transport,
            topic: topic.into(),
        }
    }

    /// Topic this gateway publishes to
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Underlying transport, shared with the dispatcher.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Encode `envelope` and publish it, waiting for the broker ack.
    pub async fn publish(&self, envelope: &Envelope) -> Result<Delivery, TransportError> {
        let call_id = envelope.call_id();
        let bytes =
            envelope::encode(envelope).map_err(|e| TransportError::Encode(e.to_string()))?;
        let key = call_id.to_string();

        match self
            .transport
            .publish(&self.topic, Some(key.as_bytes()), bytes)
            .await
        {
            Ok(delivery) => {
                debug!(
                    call_id = %call_id,
                    method = envelope.method(),
                    kind = %envelope.kind(),
                    offset = delivery.offset,
                    "Published envelope"
                );
                Ok(delivery)
            }
            Err(e) => {
                warn!(
                    call_id = %call_id,
                    method = envelope.method(),
                    kind = %envelope.kind(),
                    topic = %self.topic,
                    error = %e,
                    "Publish failed"
                );
                Err(e)
            }
        }
    }
}
