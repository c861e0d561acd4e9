//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     ConnectionPool::shutdown → trigger
//!     → acquirers in backoff fail with PoolClosed
//!     → health monitor loop exits
//!
//! Drain (drain.rs):
//!     every reservation holds a DrainToken
//!     → shutdown waits for zero or the drain timeout
//!     → then every connection is closed
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop admitting, stop monitor, drain, close
//! - Shutdown has timeout: forced close after deadline

pub mod drain;
pub mod shutdown;

pub use drain::{DrainToken, DrainTracker};
pub use shutdown::{Shutdown, ShutdownSignal};
