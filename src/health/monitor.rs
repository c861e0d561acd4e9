//! Background reconnection.
//!
//! # Responsibilities
//! - Periodically sweep every slot
//! - Take dead connections out of their slot and close them
//! - Open replacements and swap them in with a compare-and-swap
//! - Absorb failures; a failed slot is simply tried again next sweep

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::{self, MissedTickBehavior};

use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::pool::pool::PoolInner;
use crate::pool::stats::PoolCounters;

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted: usize,
    pub reconnected: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct HealthMonitor {
    pool: Arc<PoolInner>,
    interval: Duration,
}

impl HealthMonitor {
    pub(crate) fn new(pool: Arc<PoolInner>) -> Self {
        let interval = pool.tuning.monitor_interval;
        Self { pool, interval }
    }

    /// Sweep every `interval` until shutdown. Never returns an error.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        tracing::info!(
            pool_id = %self.pool.id,
            interval = ?self.interval,
            "Health monitor starting"
        );

        // Warm-up just ran, so the first sweep waits a full interval.
        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => break,
            }
            tokio::select! {
                _ = self.sweep() => {}
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!(pool_id = %self.pool.id, "Health monitor stopped");
    }

    /// Inspect every slot once and reconnect the ones without an open
    /// connection.
    pub(crate) async fn sweep(&self) -> SweepReport {
        let slots = &self.pool.slots;
        let mut report = SweepReport::default();
        if self.pool.is_closed() {
            return report;
        }
        let mut to_reconnect = Vec::new();

        for index in 0..slots.len() {
            match slots.load(index) {
                Some(conn) if conn.is_open() => {}
                Some(conn) => {
                    // Swap in the reconnecting placeholder first so scans stop
                    // seeing the dead connection.
                    if slots.replace(index, &Some(conn.clone()), None) {
                        report.evicted += 1;
                        tracing::info!(
                            pool_id = %self.pool.id,
                            slot = index,
                            connection_id = %conn.id(),
                            in_flight = conn.in_flight(),
                            age = ?conn.age(),
                            "Evicting dead connection"
                        );
                        conn.close().await;
                        to_reconnect.push(index);
                    }
                }
                None => to_reconnect.push(index),
            }
        }

        let results = join_all(to_reconnect.into_iter().map(|index| self.reconnect(index))).await;
        for reconnected in results {
            if reconnected {
                report.reconnected += 1;
            } else {
                report.failed += 1;
            }
        }

        let counts = slots.counts();
        metrics::record_pool_gauges(counts.open, counts.in_flight);
        if report != SweepReport::default() {
            tracing::debug!(
                pool_id = %self.pool.id,
                evicted = report.evicted,
                reconnected = report.reconnected,
                failed = report.failed,
                open = counts.open,
                "Health sweep finished"
            );
        }
        report
    }

    async fn reconnect(&self, index: usize) -> bool {
        let pool = &self.pool;
        match pool.open_connection(index).await {
            Ok(conn) => {
                if !pool.slots.replace(index, &None, Some(conn.clone())) {
                    // Slot was filled or emptied by shutdown meanwhile.
                    conn.close().await;
                    return false;
                }
                PoolCounters::incr(&pool.counters.reconnects);
                metrics::record_reconnect(true);
                tracing::info!(
                    pool_id = %pool.id,
                    slot = index,
                    connection_id = %conn.id(),
                    "Connection re-established"
                );
                true
            }
            Err(e) => {
                PoolCounters::incr(&pool.counters.reconnect_failures);
                metrics::record_reconnect(false);
                tracing::warn!(
                    pool_id = %pool.id,
                    endpoint = %pool.endpoint,
                    slot = index,
                    error = %e,
                    "Reconnect failed, will retry next sweep"
                );
                false
            }
        }
    }
}
