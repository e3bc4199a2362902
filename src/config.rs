use std::time::Duration;

use crate::limits::{DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_BASE_DELAY};
use crate::notify::{ReconnectPolicy, StreamConfig};

/// Runtime settings of the `staffline` binary, read from `STAFFLINE_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub endpoint: String,
    pub path: String,
    pub subscriber: String,
    pub max_reconnects: u32,
    pub reconnect_base: Duration,
    pub metrics_port: Option<u16>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unparsable numbers fall back to defaults.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            endpoint: var("STAFFLINE_ENDPOINT").unwrap_or_else(|| "127.0.0.1:8000".into()),
            path: var("STAFFLINE_PATH").unwrap_or_else(|| "/api/v1/notifications/ws".into()),
            subscriber: var("STAFFLINE_SUBSCRIBER").unwrap_or_else(|| "manager".into()),
            max_reconnects: var("STAFFLINE_MAX_RECONNECTS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_RECONNECT_ATTEMPTS),
            reconnect_base: var("STAFFLINE_RECONNECT_BASE_MS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RECONNECT_BASE_DELAY),
            metrics_port: var("STAFFLINE_METRICS_PORT").and_then(|s| s.parse().ok()),
        }
    }

    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            reconnect: ReconnectPolicy {
                max_attempts: self.max_reconnects,
                base_delay: self.reconnect_base,
            },
        }
    }
}
