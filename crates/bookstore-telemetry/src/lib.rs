//! # Bookstore Telemetry
//!
//! Logging setup shared by bookstore binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bookstore_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BOOKSTORE_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directives |
//! | `BOOKSTORE_JSON_LOGS` | `false` | One JSON object per line |
//! | `BOOKSTORE_SERVICE_NAME` | `bookstore` | Service name attached to startup logs |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("invalid log filter {directives:?}: {reason}")]
    Filter { directives: String, reason: String },

    #[error("failed to install global subscriber: {0}")]
    Subscriber(String),
}
