//! Node configuration: defaults plus environment overrides.

use bookstore_rpc::RpcConfig;
use bookstore_telemetry::TelemetryConfig;
use humantime_serde::re::humantime;
use std::env;
use std::str::FromStr;
use tracing::warn;

/// Everything the node needs to start.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub rpc: RpcConfig,
    pub telemetry: TelemetryConfig,
    /// Run a `Ping` round trip after startup.
    pub probe_on_start: bool,
}

/// Load configuration from the process environment.
pub fn load_config() -> NodeConfig {
    NodeConfig::from_lookup(|key| env::var(key).ok())
}

impl NodeConfig {
    /// Apply overrides read through `lookup`. Unparsable values are logged
    /// and the default kept.
    ///
    /// - `BOOKSTORE_TOPIC`
    /// - `BOOKSTORE_CALL_TIMEOUT` (humantime, e.g. `30s`, `500ms`)
    /// - `BOOKSTORE_WORKERS`
    /// - `BOOKSTORE_BACKLOG`
    /// - `BOOKSTORE_CHANNEL_CAPACITY`
    /// - `BOOKSTORE_PROBE` (`false`/`0` disables)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = NodeConfig {
            rpc: RpcConfig::default(),
            telemetry: TelemetryConfig::from_lookup(&lookup),
            probe_on_start: true,
        };

        if let Some(topic) = lookup("BOOKSTORE_TOPIC") {
            config.rpc.topic = topic;
        }
        if let Some(raw) = lookup("BOOKSTORE_CALL_TIMEOUT") {
            match humantime::parse_duration(&raw) {
                Ok(timeout) => config.rpc.call_timeout = timeout,
                Err(e) => warn!(value = %raw, error = %e, "Ignoring BOOKSTORE_CALL_TIMEOUT"),
            }
        }
        override_number(&lookup, "BOOKSTORE_WORKERS", &mut config.rpc.worker_pool_size);
        override_number(&lookup, "BOOKSTORE_BACKLOG", &mut config.rpc.request_backlog);
        override_number(
            &lookup,
            "BOOKSTORE_CHANNEL_CAPACITY",
            &mut config.rpc.channel_capacity,
        );
        if let Some(raw) = lookup("BOOKSTORE_PROBE") {
            config.probe_on_start = !(raw.eq_ignore_ascii_case("false") || raw == "0");
        }

        config
    }
}

fn override_number<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) {
    if let Some(raw) = lookup(key) {
        match raw.parse() {
            Ok(value) => *slot = value,
            Err(_) => warn!(key, value = %raw, "Ignoring non-numeric override"),
        }
    }
}
