//! Exponential backoff with jitter.
//!
//! Delays never decrease from one retry to the next: jitter is at most 10%
//! of the uncapped delay, the next step doubles it, and the cap is applied
//! after jitter.

use std::time::Duration;

use rand::Rng;

/// Bounded, non-decreasing delay curve between acquisition attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
    jitter: bool,
}

impl Backoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        let base_ms = base_ms.max(1);
        Self {
            base_ms,
            max_ms: max_ms.max(base_ms),
            jitter: false,
        }
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }

    /// Delay before retry number `retry` (1-based). Retry 0 is the initial
    /// scan and has no delay.
    pub fn delay(&self, retry: u32) -> Duration {
        calculate_backoff(retry, self.base_ms, self.max_ms, self.jitter)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(50, 1_000).with_jitter(true)
    }
}

/// Calculate exponential backoff delay with optional jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64, jitter: bool) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);

    // Apply jitter (0 to 10% of the uncapped delay)
    let jitter_range = delay_ms / 10;
    let jitter_ms = if jitter && jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(delay_ms.saturating_add(jitter_ms).min(max_ms))
}
