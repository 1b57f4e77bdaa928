//! Shared fixtures.
//!
//! Each fixture runs two endpoints on one in-memory broker, the way the
//! services are deployed: the API tier serves no methods and only makes
//! calls; the storage tier answers them.

use async_trait::async_trait;
use bookstore_bus::{Delivery, InMemoryBroker, MessageStream, Transport, TransportError};
use bookstore_rpc::{
    book_methods, InMemoryBookStorage, MethodTable, RpcConfig, RpcEndpoint,
};
use std::sync::Arc;
use std::time::Duration;

pub const TOPIC: &str = "books";

pub fn config(workers: usize) -> RpcConfig {
    RpcConfig {
        topic: TOPIC.to_string(),
        call_timeout: Duration::from_secs(2),
        worker_pool_size: workers,
        ..RpcConfig::default()
    }
}

/// API tier and storage tier on one broker.
pub struct TwoTier {
    pub broker: Arc<InMemoryBroker>,
    pub api: RpcEndpoint,
    pub storage_tier: RpcEndpoint,
}

impl TwoTier {
    /// Storage tier serving `methods` with `workers` slots.
    pub async fn start(methods: MethodTable, workers: usize) -> Self {
        let broker = Arc::new(InMemoryBroker::new());
        let api = api_tier(broker.clone()).await;
        let storage_tier = RpcEndpoint::start(broker.clone(), methods, &config(workers))
            .await
            .expect("storage tier starts");
        Self {
            broker,
            api,
            storage_tier,
        }
    }

    /// Storage tier serving the book methods from fresh in-memory storage.
    pub async fn with_books() -> (Self, Arc<InMemoryBookStorage>) {
        let storage = Arc::new(InMemoryBookStorage::new());
        let tiers = Self::start(book_methods(storage.clone()), 10).await;
        (tiers, storage)
    }

    pub async fn shutdown(self) {
        self.api.shutdown().await;
        self.storage_tier.shutdown().await;
    }
}

/// An endpoint that serves nothing, only calls.
pub async fn api_tier(transport: Arc<dyn Transport>) -> RpcEndpoint {
    RpcEndpoint::start(transport, MethodTable::default(), &config(1))
        .await
        .expect("api tier starts")
}

/// Reads normally, refuses every publish.
pub struct FailingTransport {
    inner: Arc<InMemoryBroker>,
}

impl FailingTransport {
    pub fn new(inner: Arc<InMemoryBroker>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Transport for FailingTransport {
    async fn publish(
        &self,
        topic: &str,
        _key: Option<&[u8]>,
        _payload: Vec<u8>,
    ) -> Result<Delivery, TransportError> {
        Err(TransportError::NotAcknowledged {
            topic: topic.to_string(),
            reason: "delivery report timed out".into(),
        })
    }

    async fn subscribe(&self, topic: &str) -> Result<MessageStream, TransportError> {
        self.inner.subscribe(topic).await
    }
}
