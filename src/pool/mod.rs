//! Connection pool subsystem.
//!
//! # Data Flow
//! ```text
//! ConnectionPool::acquire (pool.rs)
//!     → acquisition.rs (Scanning → Waiting → ... → Exhausted)
//!         → selection.rs (order slots, try_reserve_slot on each)
//!             → slots.rs (consistent load of each slot)
//!     → PooledConnection (guard.rs) on success
//!     → PoolBusy / ServerUnavailable / PoolClosed on failure
//!
//! Drop(PooledConnection)
//!     → Connection::release_slot + drain token released
//! ```
//!
//! # Design Decisions
//! - No pool-wide lock: counters are atomics, slots are atomic pointers
//! - Busy and unavailable are distinguished by the last scan's cause
//! - Slot count is fixed at `pool_size` for the pool's lifetime

pub mod acquisition;
pub mod guard;
#[allow(clippy::module_inception)]
pub mod pool;
pub mod selection;
pub mod slots;
pub mod stats;

pub use acquisition::AcquisitionPolicy;
pub use guard::PooledConnection;
pub use pool::{ConnectionPool, ShutdownReport};
pub use selection::{MissCause, SelectionStrategy};
pub use stats::PoolStats;
