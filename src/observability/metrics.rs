//! Metrics collection and exposition.
//!
//! # Metrics
//! - `graph_pool_acquire_total` (counter): acquisitions by outcome
//! - `graph_pool_reconnect_total` (counter): monitor reconnects by outcome
//! - `graph_pool_open_connections` (gauge): open connections after a sweep
//! - `graph_pool_in_flight` (gauge): reserved request slots after a sweep
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Requires a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Outcome label for `graph_pool_acquire_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    Acquired,
    Busy,
    Unavailable,
    Closed,
    TimedOut,
}

impl AcquireOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcquireOutcome::Acquired => "acquired",
            AcquireOutcome::Busy => "busy",
            AcquireOutcome::Unavailable => "unavailable",
            AcquireOutcome::Closed => "closed",
            AcquireOutcome::TimedOut => "timed_out",
        }
    }
}

pub fn record_acquire(outcome: AcquireOutcome, attempts: u32) {
    counter!("graph_pool_acquire_total", "outcome" => outcome.as_str()).increment(1);
    if attempts > 1 {
        counter!("graph_pool_acquire_retries_total").increment(u64::from(attempts - 1));
    }
}

pub fn record_reconnect(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("graph_pool_reconnect_total", "outcome" => outcome).increment(1);
}

pub fn record_pool_gauges(open_connections: usize, in_flight: usize) {
    gauge!("graph_pool_open_connections").set(open_connections as f64);
    gauge!("graph_pool_in_flight").set(in_flight as f64);
}
