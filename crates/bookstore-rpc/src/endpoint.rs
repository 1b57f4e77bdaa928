//! Process-level wiring of the correlation layer.
//!
//! One endpoint per process: one registry, one dispatcher, one pool. The
//! client and the dispatcher share the registry, so responses read by the
//! dispatcher reach callers of this endpoint's client.

use crate::domain::config::{ConfigError, RpcConfig};
use crate::domain::pending::CorrelationRegistry;
use crate::ipc::client::RpcClient;
use crate::ipc::dispatcher::{DispatchError, DispatcherHandle, InboundDispatcher};
use crate::ipc::gateway::OutboundGateway;
use crate::ipc::methods::MethodTable;
use crate::ipc::pool::WorkerPool;
use bookstore_bus::Transport;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Failure to start an endpoint.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// A running client + dispatcher pair on one topic.
pub struct RpcEndpoint {
    client: RpcClient,
    registry: Arc<CorrelationRegistry>,
    pool: WorkerPool,
    dispatcher: DispatcherHandle,
}

impl RpcEndpoint {
    /// Validate `config`, subscribe and start dispatching.
    pub async fn start(
        transport: Arc<dyn Transport>,
        methods: MethodTable,
        config: &RpcConfig,
    ) -> Result<Self, EndpointError> {
        config.validate()?;

        let registry = Arc::new(CorrelationRegistry::new());
        let gateway = Arc::new(OutboundGateway::new(transport, config.topic.clone()));
        let pool = WorkerPool::new(config.worker_pool_size);

        let dispatcher = InboundDispatcher::new(
            gateway.clone(),
            registry.clone(),
            Arc::new(methods),
            pool.clone(),
            config.request_backlog,
        )
        .start()
        .await?;

        let client = RpcClient::new(registry.clone(), gateway, config.call_timeout);

        info!(
            topic = %config.topic,
            call_timeout = ?config.call_timeout,
            "RPC endpoint ready"
        );

        Ok(Self {
            client,
            registry,
            pool,
            dispatcher,
        })
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    pub fn registry(&self) -> &Arc<CorrelationRegistry> {
        &self.registry
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn dispatcher(&self) -> &DispatcherHandle {
        &self.dispatcher
    }

    /// Stop the dispatcher, wait for admitted requests, then close the pool.
    ///
    /// Pool handles cloned from [`pool`](Self::pool) refuse new slots
    /// afterwards.
    pub async fn shutdown(self) {
        self.dispatcher.shutdown().await;
        self.pool.close();
        info!(
            pending = self.registry.pending_count(),
            "RPC endpoint shut down"
        );
    }
}
