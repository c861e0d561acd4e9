//! Validated pool settings.
//!
//! Each setter checks its range before storing, so an invalid value never
//! replaces a valid one. The pool takes a copy at construction and never
//! sees later mutations.

use serde::Serialize;

use crate::error::PoolError;

pub const DEFAULT_POOL_SIZE: usize = 4;
pub const DEFAULT_MAX_IN_PROCESS_PER_CONNECTION: usize = 32;
pub const DEFAULT_GET_OPEN_CONNECTION_RETRIES: u32 = 4;

/// Sizing and retry settings for a [`ConnectionPool`](crate::pool::ConnectionPool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSettings {
    pool_size: usize,
    max_in_process_per_connection: usize,
    get_open_connection_retries: u32,
}

impl PoolSettings {
    /// Build settings from raw values, failing on the first out-of-range one.
    pub fn new(
        pool_size: i64,
        max_in_process_per_connection: i64,
        get_open_connection_retries: i64,
    ) -> Result<Self, PoolError> {
        let mut settings = Self::default();
        settings.set_pool_size(pool_size)?;
        settings.set_max_in_process_per_connection(max_in_process_per_connection)?;
        settings.set_get_open_connection_retries(get_open_connection_retries)?;
        Ok(settings)
    }

    /// Number of connection slots in the pool.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Must be > 0.
    pub fn set_pool_size(&mut self, value: i64) -> Result<(), PoolError> {
        self.pool_size = positive("PoolSize", value)?;
        Ok(())
    }

    /// Maximum in-flight requests on a single connection. When every
    /// connection is at this limit, acquisition fails with
    /// [`PoolError::PoolBusy`] once retries are used up.
    pub fn max_in_process_per_connection(&self) -> usize {
        self.max_in_process_per_connection
    }

    /// Must be > 0.
    pub fn set_max_in_process_per_connection(&mut self, value: i64) -> Result<(), PoolError> {
        self.max_in_process_per_connection = positive("MaxInProcessPerConnection", value)?;
        Ok(())
    }

    /// Additional scans after the first when no connection can take a
    /// request.
    ///
    /// Zero fails immediately. The health monitor keeps reconnecting in the
    /// background regardless of this value.
    pub fn get_open_connection_retries(&self) -> u32 {
        self.get_open_connection_retries
    }

    /// Must be >= 0.
    pub fn set_get_open_connection_retries(&mut self, value: i64) -> Result<(), PoolError> {
        if value < 0 {
            return Err(PoolError::invalid(
                "GetOpenConnectionRetries",
                format!("must be >= 0, got {}", value),
            ));
        }
        self.get_open_connection_retries = u32::try_from(value).map_err(|_| {
            PoolError::invalid(
                "GetOpenConnectionRetries",
                format!("must be <= {}, got {}", u32::MAX, value),
            )
        })?;
        Ok(())
    }

    /// Total scans an acquisition may make.
    pub fn max_attempts(&self) -> u32 {
        self.get_open_connection_retries.saturating_add(1)
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            max_in_process_per_connection: DEFAULT_MAX_IN_PROCESS_PER_CONNECTION,
            get_open_connection_retries: DEFAULT_GET_OPEN_CONNECTION_RETRIES,
        }
    }
}

fn positive(field: &'static str, value: i64) -> Result<usize, PoolError> {
    if value <= 0 {
        return Err(PoolError::invalid(field, format!("must be > 0, got {}", value)));
    }
    usize::try_from(value)
        .map_err(|_| PoolError::invalid(field, format!("does not fit in usize: {}", value)))
}
