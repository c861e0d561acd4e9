//! In-flight request tracking for graceful shutdown.
//!
//! Counts reservations across the whole pool, including ones held on
//! connections that have since been replaced in their slot.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct DrainState {
    active: AtomicUsize,
    idle: Notify,
}

/// Tracks outstanding reservations and wakes a waiter when they reach zero.
#[derive(Debug, Clone, Default)]
pub struct DrainTracker {
    state: Arc<DrainState>,
}

impl DrainTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new reservation. Returns a token that decrements on drop.
    pub fn track(&self) -> DrainToken {
        self.state.active.fetch_add(1, Ordering::SeqCst);
        DrainToken {
            state: Arc::clone(&self.state),
        }
    }

    pub fn active_count(&self) -> usize {
        self.state.active.load(Ordering::SeqCst)
    }

    /// Wait until no reservations remain, or the timeout passes.
    ///
    /// Returns true if the pool drained in time.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                // Register before checking so a release in between is not missed.
                let notified = self.state.idle.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                if self.active_count() == 0 {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

/// Held alongside each reservation.
#[derive(Debug)]
pub struct DrainToken {
    state: Arc<DrainState>,
}

impl Drop for DrainToken {
    fn drop(&mut self) {
        if self.state.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.state.idle.notify_waiters();
        }
    }
}
