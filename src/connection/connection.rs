//! A single pooled connection and its load.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Admit requests up to `max_in_process` (CAS on the in-flight counter)
//! - Track liveness; a dead connection admits nothing
//! - Delegate frame I/O to the transport, marking itself dead on failure

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::connection::transport::Transport;
use crate::error::PoolError;

/// Upper bound on a transport's `close`. A transport that takes longer is
/// abandoned; the connection is already marked dead.
pub const CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Outcome of trying to admit one more request onto a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotReservation {
    Reserved,
    /// At `max_in_process`. A normal admission signal, not an error.
    Full,
    /// Dead or closed.
    Unavailable,
}

/// One live link to the server.
pub struct Connection {
    id: ConnectionId,
    slot: usize,
    transport: Box<dyn Transport>,
    max_in_process: usize,
    in_flight: AtomicUsize,
    open: AtomicBool,
    created_at: Instant,
}

impl Connection {
    pub fn new(slot: usize, transport: Box<dyn Transport>, max_in_process: usize) -> Self {
        Self {
            id: ConnectionId::new(),
            slot,
            transport,
            max_in_process,
            in_flight: AtomicUsize::new(0),
            open: AtomicBool::new(true),
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Index of the pool slot this connection occupies.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Current number of reserved request slots.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn max_in_process(&self) -> usize {
        self.max_in_process
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Open means neither marked dead nor reported closed by the transport.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && self.transport.is_open()
    }

    /// Reserve one request slot if the connection is open and below its limit.
    pub fn try_reserve_slot(&self) -> SlotReservation {
        if !self.is_open() {
            return SlotReservation::Unavailable;
        }

        let mut prev = self.in_flight.load(Ordering::Acquire);
        loop {
            if prev >= self.max_in_process {
                return SlotReservation::Full;
            }
            match self.in_flight.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(x) => prev = x,
            }
        }

        // A concurrent mark_dead may have landed between the liveness check
        // and the increment.
        if !self.open.load(Ordering::Acquire) {
            let _ = self.release_slot();
            return SlotReservation::Unavailable;
        }
        SlotReservation::Reserved
    }

    /// Give back one reserved slot, returning the remaining in-flight count.
    pub fn release_slot(&self) -> Result<usize, PoolError> {
        let mut prev = self.in_flight.load(Ordering::Acquire);
        loop {
            if prev == 0 {
                return Err(PoolError::SlotUnderflow(self.id));
            }
            match self.in_flight.compare_exchange_weak(
                prev,
                prev - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(prev - 1),
                Err(x) => prev = x,
            }
        }
    }

    /// Flag the connection dead. Returns true if this call made the transition.
    pub fn mark_dead(&self) -> bool {
        let was_open = self.open.swap(false, Ordering::AcqRel);
        if was_open {
            tracing::debug!(
                connection_id = %self.id,
                slot = self.slot,
                in_flight = self.in_flight(),
                "Connection marked dead"
            );
        }
        was_open
    }

    /// Send one frame, marking the connection dead if the transport fails.
    pub async fn send(&self, frame: &[u8]) -> Result<(), PoolError> {
        self.transport.send(frame).await.map_err(|e| {
            tracing::warn!(connection_id = %self.id, error = %e, "Send failed");
            self.mark_dead();
            PoolError::Transport(e)
        })
    }

    /// Receive one frame, marking the connection dead if the transport fails.
    pub async fn receive(&self) -> Result<Vec<u8>, PoolError> {
        self.transport.receive().await.map_err(|e| {
            tracing::warn!(connection_id = %self.id, error = %e, "Receive failed");
            self.mark_dead();
            PoolError::Transport(e)
        })
    }

    /// Mark dead and close the transport, giving up after [`CLOSE_TIMEOUT`].
    pub(crate) async fn close(&self) {
        self.mark_dead();
        if tokio::time::timeout(CLOSE_TIMEOUT, self.transport.close())
            .await
            .is_err()
        {
            tracing::warn!(
                connection_id = %self.id,
                timeout = ?CLOSE_TIMEOUT,
                "Transport close timed out, abandoning it"
            );
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("slot", &self.slot)
            .field("in_flight", &self.in_flight())
            .field("max_in_process", &self.max_in_process)
            .field("open", &self.open.load(Ordering::Relaxed))
            .finish()
    }
}
