//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Acquisition miss (no connection with spare capacity):
//!     → backoff.rs (delay before the next scan)
//!     → pool::acquisition re-scans after the delay
//! ```
//!
//! # Design Decisions
//! - Curve is bounded and monotonically non-decreasing
//! - Jitter spreads concurrent waiters without breaking monotonicity

pub mod backoff;
