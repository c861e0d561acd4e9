//! Scan order and the single non-blocking scan.
//!
//! # Responsibilities
//! - Order candidate connections for a scan (least-loaded or round-robin)
//! - Reserve a slot on the first connection that admits the request
//! - Classify a miss as saturated or as no open connection

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::connection::{Connection, SlotReservation};
use crate::pool::slots::SlotTable;

/// Why a scan found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissCause {
    /// At least one connection is open, but every open one is full.
    Saturated,
    /// No connection is open.
    NoOpenConnection,
}

/// Result of one pass over the slot table.
#[derive(Debug)]
pub enum ScanOutcome<T> {
    Reserved(T),
    Miss(MissCause),
    Closed,
}

/// Orders the connections a scan will try.
pub trait ScanOrder: Send + Sync + fmt::Debug {
    fn order(&self, candidates: &mut [Arc<Connection>]);
}

/// Strategy names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    #[default]
    LeastLoaded,
    RoundRobin,
}

impl SelectionStrategy {
    pub fn build(self) -> Box<dyn ScanOrder> {
        match self {
            SelectionStrategy::LeastLoaded => Box::new(LeastLoaded),
            SelectionStrategy::RoundRobin => Box::new(RoundRobin::new()),
        }
    }
}

/// Fewest in-flight requests first; ties go to the lower slot index.
///
/// Loads are read once per scan; the counters keep moving while the slice
/// is sorted.
#[derive(Debug, Default)]
pub struct LeastLoaded;

impl ScanOrder for LeastLoaded {
    fn order(&self, candidates: &mut [Arc<Connection>]) {
        candidates.sort_by_cached_key(|c| (c.in_flight(), c.slot()));
    }
}

/// Rotates the starting slot on every scan.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScanOrder for RoundRobin {
    fn order(&self, candidates: &mut [Arc<Connection>]) {
        if candidates.is_empty() {
            return;
        }
        candidates.sort_by_key(|c| c.slot());
        let start = self.counter.fetch_add(1, Ordering::Relaxed) % candidates.len();
        candidates.rotate_left(start);
    }
}

/// Try every slot once, in `order`, reserving on the first that admits.
///
/// Connections whose transport reports closed are marked dead on the way so
/// the health monitor replaces them.
pub fn scan(slots: &SlotTable, order: &dyn ScanOrder) -> ScanOutcome<Arc<Connection>> {
    let mut candidates = slots.occupied();
    order.order(&mut candidates);

    let mut saw_open = false;
    for conn in candidates {
        match conn.try_reserve_slot() {
            SlotReservation::Reserved => return ScanOutcome::Reserved(conn),
            SlotReservation::Full => saw_open = true,
            SlotReservation::Unavailable => {
                conn.mark_dead();
            }
        }
    }

    if saw_open {
        ScanOutcome::Miss(MissCause::Saturated)
    } else {
        ScanOutcome::Miss(MissCause::NoOpenConnection)
    }
}
