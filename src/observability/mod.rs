//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pool, acquisition policy and health monitor produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!     → pool::stats (PoolStats snapshot for callers)
//! ```
//!
//! # Design Decisions
//! - Background reconnect failures are only visible here, never raised
//! - Metrics are cheap (atomic increments); exporter is optional

pub mod logging;
pub mod metrics;
