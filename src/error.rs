//! Error taxonomy for the pool.
//!
//! # Kinds
//! - `InvalidConfiguration`: a setting is out of range, raised at assignment
//! - `PoolBusy`: every connection is open but saturated
//! - `ServerUnavailable`: no connection is open
//! - `PoolClosed`: the pool has been shut down
//! - `SlotUnderflow`: a slot was released more often than reserved
//!
//! # Design Decisions
//! - Busy and unavailable are never merged; the last observed cause wins
//! - Invariant violations are logged where they happen, not retried

use std::time::Duration;

use crate::connection::ConnectionId;

/// Errors produced by pool configuration, acquisition and connection I/O.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("invalid configuration for {field}: {message}")]
    InvalidConfiguration {
        field: &'static str,
        message: String,
    },

    #[error("pool busy: all {pool_size} connections are at {max_in_process} in-flight requests after {attempts} attempts")]
    PoolBusy {
        pool_size: usize,
        max_in_process: usize,
        attempts: u32,
    },

    #[error("server unavailable: no open connection to {endpoint} after {attempts} attempts")]
    ServerUnavailable { endpoint: String, attempts: u32 },

    #[error("pool is closed")]
    PoolClosed,

    #[error("timed out after {0:?} waiting for a connection")]
    AcquireTimeout(Duration),

    #[error("slot released below zero on {0}")]
    SlotUnderflow(ConnectionId),

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl PoolError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            message: message.into(),
        }
    }

    /// Whether a caller may reasonably retry the failed operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PoolError::PoolBusy { .. }
                | PoolError::ServerUnavailable { .. }
                | PoolError::AcquireTimeout(_)
        )
    }
}
