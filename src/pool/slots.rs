//! Fixed-size slot table.
//!
//! Each slot holds either a connection or nothing; an empty slot is a
//! connection being re-established. Slots are swapped with a pointer
//! compare-and-swap, so a concurrent scan loads either the whole old or the
//! whole new connection.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::connection::Connection;

/// Live and reconnecting slot counts at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotCounts {
    pub open: usize,
    pub reconnecting: usize,
    pub in_flight: usize,
}

#[derive(Debug)]
pub struct SlotTable {
    slots: Vec<ArcSwapOption<Connection>>,
}

impl SlotTable {
    /// Create `size` empty slots. The length never changes afterwards.
    pub fn new(size: usize) -> Self {
        Self {
            slots: (0..size).map(|_| ArcSwapOption::empty()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn load(&self, index: usize) -> Option<Arc<Connection>> {
        self.slots.get(index).and_then(|slot| slot.load_full())
    }

    /// Every occupied slot, open or not.
    pub fn occupied(&self) -> Vec<Arc<Connection>> {
        self.slots.iter().filter_map(|slot| slot.load_full()).collect()
    }

    /// Swap `new` into the slot if it still holds `expected`.
    ///
    /// Returns false when another writer changed the slot first.
    pub fn replace(
        &self,
        index: usize,
        expected: &Option<Arc<Connection>>,
        new: Option<Arc<Connection>>,
    ) -> bool {
        let Some(slot) = self.slots.get(index) else {
            return false;
        };
        let previous = slot.compare_and_swap(expected, new);
        same(&previous, expected)
    }

    /// Empty every slot, returning what was there.
    pub fn take_all(&self) -> Vec<Arc<Connection>> {
        self.slots.iter().filter_map(|slot| slot.swap(None)).collect()
    }

    pub fn counts(&self) -> SlotCounts {
        let mut counts = SlotCounts::default();
        for slot in &self.slots {
            match slot.load_full() {
                Some(conn) if conn.is_open() => {
                    counts.open += 1;
                    counts.in_flight += conn.in_flight();
                }
                _ => counts.reconnecting += 1,
            }
        }
        counts
    }
}

fn same(a: &Option<Arc<Connection>>, b: &Option<Arc<Connection>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connection::tests::stub_connection;

    #[test]
    fn starts_empty_and_reconnecting() {
        let table = SlotTable::new(3);
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.counts(),
            SlotCounts {
                open: 0,
                reconnecting: 3,
                in_flight: 0
            }
        );
    }

    #[test]
    fn replace_is_compare_and_swap() {
        let table = SlotTable::new(1);
        let first = Arc::new(stub_connection(0, 1));
        let second = Arc::new(stub_connection(0, 1));

        assert!(table.replace(0, &None, Some(first.clone())));
        // Stale expectation loses.
        assert!(!table.replace(0, &None, Some(second.clone())));
        assert!(Arc::ptr_eq(&table.load(0).unwrap(), &first));

        assert!(table.replace(0, &Some(first), Some(second.clone())));
        assert!(Arc::ptr_eq(&table.load(0).unwrap(), &second));
    }

    #[test]
    fn out_of_range_replace_fails() {
        let table = SlotTable::new(1);
        assert!(!table.replace(5, &None, Some(Arc::new(stub_connection(5, 1)))));
        assert!(table.load(5).is_none());
    }

    #[test]
    fn take_all_empties_the_table() {
        let table = SlotTable::new(2);
        table.replace(0, &None, Some(Arc::new(stub_connection(0, 1))));
        table.replace(1, &None, Some(Arc::new(stub_connection(1, 1))));

        assert_eq!(table.take_all().len(), 2);
        assert!(table.occupied().is_empty());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn counts_dead_as_reconnecting() {
        let table = SlotTable::new(2);
        let alive = Arc::new(stub_connection(0, 4));
        let dead = Arc::new(stub_connection(1, 4));
        alive.try_reserve_slot();
        dead.mark_dead();
        table.replace(0, &None, Some(alive));
        table.replace(1, &None, Some(dead));

        assert_eq!(
            table.counts(),
            SlotCounts {
                open: 1,
                reconnecting: 1,
                in_flight: 1
            }
        );
    }
}
