//! Scoped reservation of one request slot.

use std::ops::Deref;
use std::sync::Arc;

use crate::connection::Connection;
use crate::lifecycle::DrainToken;

/// A reserved request slot on a pooled connection.
///
/// Dropping the guard releases the slot exactly once, on every exit path
/// including errors and cancelled futures.
#[derive(Debug)]
pub struct PooledConnection {
    connection: Arc<Connection>,
    _drain: DrainToken,
}

impl PooledConnection {
    pub(crate) fn new(connection: Arc<Connection>, drain: DrainToken) -> Self {
        Self {
            connection,
            _drain: drain,
        }
    }

    /// The underlying connection, shared with the pool.
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Err(e) = self.connection.release_slot() {
            tracing::error!(
                connection_id = %self.connection.id(),
                error = %e,
                "Reservation released on a connection with no in-flight requests"
            );
            debug_assert!(false, "{e}");
        }
    }
}
