//! Configuration schema definitions.
//!
//! All sections derive Serde traits and default every field, so a minimal
//! file only needs the endpoint address.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::settings::{
    PoolSettings, DEFAULT_GET_OPEN_CONNECTION_RETRIES, DEFAULT_MAX_IN_PROCESS_PER_CONNECTION,
    DEFAULT_POOL_SIZE,
};
use crate::error::PoolError;
use crate::pool::selection::SelectionStrategy;
use crate::resilience::backoff::Backoff;

/// Root configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PoolConfig {
    /// Server endpoint and connect behaviour.
    pub endpoint: EndpointConfig,

    /// Pool sizing, validated through [`PoolSettings`].
    pub pool: PoolSection,

    /// Backoff between acquisition attempts.
    pub acquisition: AcquisitionConfig,

    /// Background reconnection.
    pub health: HealthConfig,

    pub shutdown: ShutdownConfig,

    pub observability: ObservabilityConfig,
}

impl PoolConfig {
    /// Resolve the raw `[pool]` integers into validated settings.
    pub fn pool_settings(&self) -> Result<PoolSettings, PoolError> {
        PoolSettings::new(
            self.pool.pool_size,
            self.pool.max_in_process_per_connection,
            self.pool.get_open_connection_retries,
        )
    }

    /// Timing knobs handed to the pool alongside its settings.
    pub fn tuning(&self) -> PoolTuning {
        PoolTuning {
            backoff: Backoff::new(
                self.acquisition.base_delay_ms,
                self.acquisition.max_delay_ms,
            )
            .with_jitter(self.acquisition.jitter),
            strategy: self.acquisition.strategy,
            monitor_interval: Duration::from_millis(self.health.interval_ms),
            connect_timeout: Duration::from_millis(self.endpoint.connect_timeout_ms),
        }
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown.drain_timeout_ms)
    }
}

/// Server endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Server address (e.g., "localhost:8182").
    pub address: String,

    /// Per-attempt connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            address: "localhost:8182".to_string(),
            connect_timeout_ms: 5_000,
        }
    }
}

/// Raw pool sizing as written in the file.
///
/// Signed on purpose: negative values must reach validation and be
/// reported, not fail deserialization with a type error.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolSection {
    pub pool_size: i64,
    pub max_in_process_per_connection: i64,
    pub get_open_connection_retries: i64,
}

impl Default for PoolSection {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE as i64,
            max_in_process_per_connection: DEFAULT_MAX_IN_PROCESS_PER_CONNECTION as i64,
            get_open_connection_retries: DEFAULT_GET_OPEN_CONNECTION_RETRIES as i64,
        }
    }
}

/// Backoff between acquisition attempts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Delay before the first retry in milliseconds.
    pub base_delay_ms: u64,

    /// Cap for the exponential curve in milliseconds.
    pub max_delay_ms: u64,

    /// Add up to 10% random jitter below the cap.
    pub jitter: bool,

    /// Scan order: "least_loaded" or "round_robin".
    pub strategy: SelectionStrategy,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 50,
            max_delay_ms: 1_000,
            jitter: true,
            strategy: SelectionStrategy::LeastLoaded,
        }
    }
}

/// Health monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Sweep interval in milliseconds.
    pub interval_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { interval_ms: 1_000 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long shutdown waits for in-flight requests before closing anyway.
    pub drain_timeout_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_ms: 5_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9091".to_string(),
        }
    }
}

/// Timing values the pool and its monitor run with.
#[derive(Debug, Clone)]
pub struct PoolTuning {
    pub backoff: Backoff,
    pub strategy: SelectionStrategy,
    pub monitor_interval: Duration,
    pub connect_timeout: Duration,
}

impl Default for PoolTuning {
    fn default() -> Self {
        PoolConfig::default().tuning()
    }
}
