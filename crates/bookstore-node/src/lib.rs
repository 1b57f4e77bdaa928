//! # Bookstore Node Library
//!
//! Wiring for the `bookstore-node` binary, exposed for testing.
//!
//! ## Startup Sequence
//!
//! 1. Create the broker and storage
//! 2. Build the method table over storage
//! 3. Start the RPC endpoint (subscribes before returning)
//! 4. Optionally run a `Ping` round trip

pub mod config;

use anyhow::{Context, Result};
use bookstore_bus::InMemoryBroker;
use bookstore_rpc::{book_methods, BookService, InMemoryBookStorage, RpcEndpoint};
use bookstore_types::methods;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

pub use config::{load_config, NodeConfig};

/// A running node.
pub struct NodeRuntime {
    endpoint: RpcEndpoint,
    books: BookService,
    broker: Arc<InMemoryBroker>,
    storage: Arc<InMemoryBookStorage>,
}

impl NodeRuntime {
    /// Create and start all components.
    pub async fn start(config: &NodeConfig) -> Result<Self> {
        info!(topic = %config.rpc.topic, "Starting bookstore node");

        let broker = Arc::new(InMemoryBroker::with_capacity(config.rpc.channel_capacity));
        let storage = Arc::new(InMemoryBookStorage::new());
        let table = book_methods(storage.clone());

        let endpoint = RpcEndpoint::start(broker.clone(), table, &config.rpc)
            .await
            .context("failed to start RPC endpoint")?;
        let books = BookService::new(endpoint.client().clone());

        let runtime = Self {
            endpoint,
            books,
            broker,
            storage,
        };

        if config.probe_on_start {
            let latency = runtime.probe().await.context("startup ping failed")?;
            info!(latency_us = latency.as_micros(), "Startup ping answered");
        }

        Ok(runtime)
    }

    /// One `Ping` round trip through the bus.
    pub async fn probe(&self) -> Result<Duration> {
        let started = Instant::now();
        let pong = self
            .endpoint
            .client()
            .invoke_default(methods::PING, Value::Null)
            .await
            .with_context(|| format!("{} call failed", methods::PING))?;
        anyhow::ensure!(pong == "pong", "unexpected ping reply: {pong}");
        Ok(started.elapsed())
    }

    pub fn books(&self) -> &BookService {
        &self.books
    }

    pub fn endpoint(&self) -> &RpcEndpoint {
        &self.endpoint
    }

    pub fn storage(&self) -> &Arc<InMemoryBookStorage> {
        &self.storage
    }

    /// Stop dispatching, drain handlers, close the broker.
    pub async fn shutdown(self) {
        info!("Shutting down bookstore node");
        self.endpoint.shutdown().await;
        self.broker.close();
        info!(
            messages = self.broker.messages_published(),
            books = self.storage.len(),
            "Node stopped"
        );
    }
}
