//! Acquisition policy: bounded retries with backoff.
//!
//! # State Transitions
//! ```text
//! Scanning → Reserved:  a connection admitted the request
//! Scanning → Waiting:   scan missed and attempts remain
//! Waiting  → Scanning:  after the backoff delay
//! Scanning → Exhausted: scan missed on the last of N+1 attempts
//! any      → Closed:    pool shut down while scanning or waiting
//! ```
//!
//! The wait is a plain sleep with no pool lock held, so other callers and the
//! health monitor keep running. Dropping the future at any point leaves
//! nothing behind.

use std::time::Duration;

use crate::lifecycle::ShutdownSignal;
use crate::pool::selection::{MissCause, ScanOutcome};
use crate::resilience::backoff::Backoff;

/// A successful acquisition and how many scans it took.
#[derive(Debug)]
pub struct Acquired<T> {
    pub value: T,
    pub attempts: u32,
}

/// Terminal failures of the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    /// Every attempt missed. `cause` is what the final scan observed.
    Exhausted { cause: MissCause, attempts: u32 },
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcquireState {
    Scanning { attempt: u32 },
    Waiting { attempt: u32, cause: MissCause },
    Exhausted { attempts: u32, cause: MissCause },
}

/// Retry policy shared by every acquisition on a pool.
#[derive(Debug, Clone)]
pub struct AcquisitionPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl AcquisitionPolicy {
    /// `retries` additional scans after the first. Zero means fail fast.
    pub fn new(retries: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay slept after a miss on `attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Drive `scan` until it reserves, the attempts run out, or the pool
    /// closes. `scan` receives the 1-based attempt number.
    pub async fn run<T, F>(
        &self,
        shutdown: &mut ShutdownSignal,
        mut scan: F,
    ) -> Result<Acquired<T>, PolicyError>
    where
        F: FnMut(u32) -> ScanOutcome<T>,
    {
        let mut state = AcquireState::Scanning { attempt: 1 };
        loop {
            state = match state {
                AcquireState::Scanning { attempt } => match scan(attempt) {
                    ScanOutcome::Reserved(value) => return Ok(Acquired { value, attempts: attempt }),
                    ScanOutcome::Closed => return Err(PolicyError::Closed),
                    ScanOutcome::Miss(cause) if attempt >= self.max_attempts => {
                        AcquireState::Exhausted {
                            attempts: attempt,
                            cause,
                        }
                    }
                    ScanOutcome::Miss(cause) => AcquireState::Waiting { attempt, cause },
                },
                AcquireState::Waiting { attempt, cause } => {
                    let delay = self.delay_after(attempt);
                    tracing::debug!(
                        attempt,
                        max_attempts = self.max_attempts,
                        cause = ?cause,
                        delay = ?delay,
                        "No connection available, backing off"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => AcquireState::Scanning { attempt: attempt + 1 },
                        _ = shutdown.recv() => return Err(PolicyError::Closed),
                    }
                }
                AcquireState::Exhausted { attempts, cause } => {
                    return Err(PolicyError::Exhausted { cause, attempts })
                }
            };
        }
    }
}
