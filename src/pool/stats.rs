//! Pool statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use uuid::Uuid;

/// Point-in-time view of a pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    pub pool_id: Uuid,
    pub endpoint: String,
    pub pool_size: usize,
    pub max_in_process_per_connection: usize,

    /// Slots holding an open connection.
    pub open_connections: usize,
    /// Slots that are empty or hold a dead connection.
    pub reconnecting_slots: usize,
    /// Reserved request slots across open connections.
    pub in_flight: usize,

    pub acquired_total: u64,
    pub busy_total: u64,
    pub unavailable_total: u64,
    pub reconnects_total: u64,
    pub reconnect_failures_total: u64,
    pub warmup_failures_total: u64,

    pub closed: bool,
}

/// Monotonic counters behind [`PoolStats`].
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub(crate) acquired: AtomicU64,
    pub(crate) busy: AtomicU64,
    pub(crate) unavailable: AtomicU64,
    pub(crate) reconnects: AtomicU64,
    pub(crate) reconnect_failures: AtomicU64,
    pub(crate) warmup_failures: AtomicU64,
}

impl PoolCounters {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
