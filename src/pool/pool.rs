//! Connection pool to a single graph server endpoint.
//!
//! # Responsibilities
//! - Open `pool_size` connections at construction
//! - Route each acquisition to a connection with spare capacity
//! - Retry through the acquisition policy, reporting busy vs unavailable
//! - Own the health monitor task and stop it on shutdown
//! - Drain and close every connection on shutdown

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::{PoolConfig, PoolSettings, PoolTuning};
use crate::connection::{Connection, Connector, TcpConnector};
use crate::error::PoolError;
use crate::health::HealthMonitor;
use crate::lifecycle::{DrainTracker, Shutdown};
use crate::observability::metrics::{self, AcquireOutcome};
use crate::pool::acquisition::{AcquisitionPolicy, PolicyError};
use crate::pool::guard::PooledConnection;
use crate::pool::selection::{self, MissCause, ScanOrder, ScanOutcome};
use crate::pool::slots::SlotTable;
use crate::pool::stats::{PoolCounters, PoolStats};

/// Summary of a completed shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// All reservations were released before the drain timeout.
    pub drained: bool,
    pub closed_connections: usize,
}

/// State shared between callers and the health monitor.
#[derive(Debug)]
pub(crate) struct PoolInner {
    pub(crate) id: Uuid,
    pub(crate) settings: PoolSettings,
    pub(crate) tuning: PoolTuning,
    pub(crate) endpoint: String,
    pub(crate) slots: SlotTable,
    pub(crate) counters: PoolCounters,
    pub(crate) shutdown: Shutdown,
    connector: Arc<dyn Connector>,
    order: Box<dyn ScanOrder>,
    policy: AcquisitionPolicy,
    drain: DrainTracker,
    closed: AtomicBool,
}

impl PoolInner {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Open one connection for `slot`, bounded by the connect timeout.
    pub(crate) async fn open_connection(&self, slot: usize) -> io::Result<Arc<Connection>> {
        let transport = tokio::time::timeout(self.tuning.connect_timeout, self.connector.connect())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timeout"))??;

        Ok(Arc::new(Connection::new(
            slot,
            transport,
            self.settings.max_in_process_per_connection(),
        )))
    }

    /// One pass of the acquisition algorithm.
    fn scan(&self, attempt: u32) -> ScanOutcome<PooledConnection> {
        // Count the reservation before checking `closed` so shutdown's drain
        // either sees it or the scan sees the pool closed.
        let token = self.drain.track();
        if self.is_closed() {
            return ScanOutcome::Closed;
        }

        match selection::scan(&self.slots, self.order.as_ref()) {
            ScanOutcome::Reserved(conn) => {
                tracing::trace!(
                    pool_id = %self.id,
                    attempt,
                    connection_id = %conn.id(),
                    in_flight = conn.in_flight(),
                    "Reserved request slot"
                );
                ScanOutcome::Reserved(PooledConnection::new(conn, token))
            }
            ScanOutcome::Miss(cause) => ScanOutcome::Miss(cause),
            ScanOutcome::Closed => ScanOutcome::Closed,
        }
    }
}

/// A fixed-size pool of multiplexed connections to one server.
#[derive(Debug)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionPool {
    /// Open the pool and start its health monitor.
    ///
    /// Connections that fail to open start in the reconnecting state and are
    /// retried by the monitor; an unreachable server surfaces later as
    /// [`PoolError::ServerUnavailable`] from [`acquire`](Self::acquire).
    pub async fn connect<C: Connector>(
        settings: PoolSettings,
        tuning: PoolTuning,
        connector: C,
    ) -> Self {
        let connector: Arc<dyn Connector> = Arc::new(connector);
        let inner = Arc::new(PoolInner {
            id: Uuid::new_v4(),
            settings,
            endpoint: connector.endpoint(),
            slots: SlotTable::new(settings.pool_size()),
            counters: PoolCounters::default(),
            shutdown: Shutdown::new(),
            order: tuning.strategy.build(),
            policy: AcquisitionPolicy::new(settings.get_open_connection_retries(), tuning.backoff),
            drain: DrainTracker::new(),
            closed: AtomicBool::new(false),
            connector,
            tuning,
        });

        let opened = join_all((0..settings.pool_size()).map(|slot| {
            let inner = inner.clone();
            async move { (slot, inner.open_connection(slot).await) }
        }))
        .await;

        let mut open = 0;
        for (slot, result) in opened {
            match result {
                Ok(conn) => {
                    inner.slots.replace(slot, &None, Some(conn));
                    open += 1;
                }
                Err(e) => {
                    PoolCounters::incr(&inner.counters.warmup_failures);
                    tracing::warn!(
                        pool_id = %inner.id,
                        endpoint = %inner.endpoint,
                        slot,
                        error = %e,
                        "Initial connection failed, leaving slot to the health monitor"
                    );
                }
            }
        }

        tracing::info!(
            pool_id = %inner.id,
            endpoint = %inner.endpoint,
            pool_size = settings.pool_size(),
            open_connections = open,
            max_in_process = settings.max_in_process_per_connection(),
            retries = settings.get_open_connection_retries(),
            "Connection pool opened"
        );

        let monitor = HealthMonitor::new(inner.clone());
        let handle = tokio::spawn(monitor.run(inner.shutdown.subscribe()));

        Self {
            inner,
            monitor: Mutex::new(Some(handle)),
        }
    }

    /// Build a TCP pool from a validated configuration file.
    pub async fn from_config(config: &PoolConfig) -> Result<Self, PoolError> {
        let settings = config.pool_settings()?;
        let tuning = config.tuning();
        let connector = TcpConnector::new(config.endpoint.address.clone());
        Ok(Self::connect(settings, tuning, connector).await)
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.inner.settings
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Reserve a request slot on a connection with spare capacity.
    ///
    /// Scans immediately; on a miss retries up to
    /// `get_open_connection_retries` times with backoff. Fails with
    /// [`PoolError::PoolBusy`] when the last scan found every open connection
    /// full, [`PoolError::ServerUnavailable`] when it found none open, and
    /// [`PoolError::PoolClosed`] after shutdown.
    pub async fn acquire(&self) -> Result<PooledConnection, PoolError> {
        let inner = &self.inner;
        if inner.is_closed() {
            metrics::record_acquire(AcquireOutcome::Closed, 0);
            return Err(PoolError::PoolClosed);
        }

        let mut shutdown = inner.shutdown.subscribe();
        let result = inner
            .policy
            .run(&mut shutdown, |attempt| inner.scan(attempt))
            .await;

        match result {
            Ok(acquired) => {
                PoolCounters::incr(&inner.counters.acquired);
                metrics::record_acquire(AcquireOutcome::Acquired, acquired.attempts);
                Ok(acquired.value)
            }
            Err(PolicyError::Closed) => {
                metrics::record_acquire(AcquireOutcome::Closed, 0);
                Err(PoolError::PoolClosed)
            }
            Err(PolicyError::Exhausted {
                cause: MissCause::Saturated,
                attempts,
            }) => {
                PoolCounters::incr(&inner.counters.busy);
                metrics::record_acquire(AcquireOutcome::Busy, attempts);
                tracing::debug!(pool_id = %inner.id, attempts, "Pool busy");
                Err(PoolError::PoolBusy {
                    pool_size: inner.settings.pool_size(),
                    max_in_process: inner.settings.max_in_process_per_connection(),
                    attempts,
                })
            }
            Err(PolicyError::Exhausted {
                cause: MissCause::NoOpenConnection,
                attempts,
            }) => {
                PoolCounters::incr(&inner.counters.unavailable);
                metrics::record_acquire(AcquireOutcome::Unavailable, attempts);
                tracing::debug!(pool_id = %inner.id, attempts, "No open connection");
                Err(PoolError::ServerUnavailable {
                    endpoint: inner.endpoint.clone(),
                    attempts,
                })
            }
        }
    }

    /// [`acquire`](Self::acquire) with a caller deadline.
    pub async fn acquire_timeout(&self, timeout: Duration) -> Result<PooledConnection, PoolError> {
        match tokio::time::timeout(timeout, self.acquire()).await {
            Ok(result) => result,
            Err(_) => {
                metrics::record_acquire(AcquireOutcome::TimedOut, 0);
                Err(PoolError::AcquireTimeout(timeout))
            }
        }
    }

    /// Return a reservation. Equivalent to dropping it.
    pub fn release(&self, connection: PooledConnection) {
        drop(connection);
    }

    /// Snapshot of slot occupancy and counters.
    pub fn stats(&self) -> PoolStats {
        let inner = &self.inner;
        let counts = inner.slots.counts();
        PoolStats {
            pool_id: inner.id,
            endpoint: inner.endpoint.clone(),
            pool_size: inner.settings.pool_size(),
            max_in_process_per_connection: inner.settings.max_in_process_per_connection(),
            open_connections: counts.open,
            reconnecting_slots: counts.reconnecting,
            in_flight: counts.in_flight,
            acquired_total: PoolCounters::get(&inner.counters.acquired),
            busy_total: PoolCounters::get(&inner.counters.busy),
            unavailable_total: PoolCounters::get(&inner.counters.unavailable),
            reconnects_total: PoolCounters::get(&inner.counters.reconnects),
            reconnect_failures_total: PoolCounters::get(&inner.counters.reconnect_failures),
            warmup_failures_total: PoolCounters::get(&inner.counters.warmup_failures),
            closed: inner.is_closed(),
        }
    }

    /// Stop admitting, stop the health monitor, wait up to `drain_timeout`
    /// for reservations to be released, then close every connection.
    ///
    /// Calling it again returns immediately.
    pub async fn shutdown(&self, drain_timeout: Duration) -> ShutdownReport {
        let inner = &self.inner;
        if inner.closed.swap(true, Ordering::AcqRel) {
            return ShutdownReport {
                drained: true,
                closed_connections: 0,
            };
        }

        tracing::info!(pool_id = %inner.id, "Connection pool shutting down");
        inner.shutdown.trigger();

        let monitor = self
            .monitor
            .lock()
            .map(|mut handle| handle.take())
            .unwrap_or_default();
        if let Some(handle) = monitor {
            if let Err(e) = handle.await {
                tracing::error!(pool_id = %inner.id, error = %e, "Health monitor task failed");
            }
        }

        let drained = inner.drain.wait_idle(drain_timeout).await;
        if !drained {
            tracing::warn!(
                pool_id = %inner.id,
                in_flight = inner.drain.active_count(),
                timeout = ?drain_timeout,
                "Drain timeout reached, closing connections with requests in flight"
            );
        }

        let connections = inner.slots.take_all();
        join_all(connections.iter().map(|conn| conn.close())).await;

        tracing::info!(
            pool_id = %inner.id,
            closed_connections = connections.len(),
            drained,
            "Connection pool closed"
        );

        ShutdownReport {
            drained,
            closed_connections: connections.len(),
        }
    }
}

impl Drop for ConnectionPool {
    fn drop(&mut self) {
        // Without an explicit shutdown the monitor would keep the shared
        // state alive; make it exit on its next wake.
        if !self.inner.is_closed() {
            self.inner.closed.store(true, Ordering::Release);
            self.inner.shutdown.trigger();
        }
    }
}
