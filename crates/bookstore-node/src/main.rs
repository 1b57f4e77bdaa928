//! # Bookstore Node
//!
//! Serves the book methods over the bus until Ctrl+C.

use anyhow::{Context, Result};
use bookstore_node::{load_config, NodeRuntime};
use bookstore_telemetry::init_logging;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config();
    init_logging(&config.telemetry).context("failed to initialize logging")?;

    let runtime = NodeRuntime::start(&config).await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
