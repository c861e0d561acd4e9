//! Health monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! Passive detection (connection.rs, selection.rs):
//!     send/receive I/O error or transport reports closed
//!     → Connection marked dead
//!
//! Active sweep (monitor.rs):
//!     Periodic timer
//!     → dead connection swapped out for a reconnecting placeholder
//!     → replacement opened (connect timeout)
//!     → swapped into the slot with compare-and-swap
//! ```
//!
//! # Design Decisions
//! - Runs independently of request traffic; callers never pay for reconnects
//! - No terminal failure state; failed slots are retried every sweep
//! - Only deadness is repaired; saturation is left to callers
//! - Stopped deterministically by the pool's shutdown signal

pub mod monitor;

pub use monitor::{HealthMonitor, SweepReport};
