//! Wraparound replay planner
//!
//! Works out which rows of the slot stream are still physically present in
//! the circular store and where the oldest of them starts.
//!
//! ## Layout
//!
//! Rows are always appended whole, so the slot stream is a dense sequence of
//! `row_width`-sized rows. Slot `k` of the stream lives at physical index
//! `k % capacity`. At most `capacity / row_width` complete rows fit; when the
//! width does not divide the capacity the trailing cells are slack.
//!
//! After wraparound the surviving rows are the last `max_storable_rows` of the
//! stream. The first of them is stream slot
//! `(inserted_rows - max_storable_rows) * row_width`, which is where replay
//! starts reading. The cursor advances one slot at a time modulo the capacity,
//! never a whole row, because the ring need not be a multiple of the width.

use alloc::vec::Vec;

use crate::codec::Slot;
use crate::storage::SlotStore;

/// Replay window over a circular slot store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayPlan {
    /// Number of complete rows to read back
    pub rows: usize,
    /// Physical index of the first slot of the oldest surviving row
    pub start_slot: usize,
    /// Slots per row
    pub row_width: usize,
    /// Capacity of the store in slots
    pub capacity: usize,
    /// Rows lost to overwrite
    pub overwritten_rows: u64,
}

impl ReplayPlan {
    /// Plan a replay of the most recent rows still held by the store
    pub fn new(inserted_rows: u64, capacity: usize, row_width: usize) -> Self {
        let max_rows = Self::max_storable_rows(capacity, row_width);
        let rows = inserted_rows.min(max_rows as u64);
        let overwritten_rows = inserted_rows - rows;

        let start_slot = if overwritten_rows == 0 || capacity == 0 {
            0
        } else {
            let first_slot_written = overwritten_rows * row_width as u64;
            (first_slot_written % capacity as u64) as usize
        };

        Self {
            rows: rows as usize,
            start_slot,
            row_width,
            capacity,
            overwritten_rows,
        }
    }

    /// Number of complete rows a store of `capacity` slots can hold
    pub const fn max_storable_rows(capacity: usize, row_width: usize) -> usize {
        if row_width == 0 { 0 } else { capacity / row_width }
    }

    /// Whether the store has wrapped and older rows were overwritten
    pub const fn is_wrapped(&self) -> bool {
        self.overwritten_rows > 0
    }

    /// A row wider than the whole store can never be replayed
    pub const fn is_degenerate(&self) -> bool {
        Self::max_storable_rows(self.capacity, self.row_width) == 0
    }

    pub const fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Physical index of slot `slot` of replayed row `row`
    ///
    /// `None` outside the replay window, which includes every slot of an
    /// empty or degenerate plan.
    pub fn physical_index(&self, row: usize, slot: usize) -> Option<usize> {
        if row >= self.rows || slot >= self.row_width {
            return None;
        }
        Some((self.start_slot + row * self.row_width + slot) % self.capacity)
    }

    /// Iterate the planned rows, oldest first, reading them from `store`
    pub fn rows<'a, S: SlotStore>(&self, store: &'a S) -> ReplayRows<'a, S> {
        ReplayRows {
            store,
            cursor: self.start_slot,
            remaining: self.rows,
            row_width: self.row_width,
            capacity: self.capacity,
        }
    }
}

/// Iterator over the raw slots of each replayed row
pub struct ReplayRows<'a, S> {
    store: &'a S,
    cursor: usize,
    remaining: usize,
    row_width: usize,
    capacity: usize,
}

impl<S: SlotStore> Iterator for ReplayRows<'_, S> {
    type Item = Vec<Slot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let mut row = Vec::with_capacity(self.row_width);
        for _ in 0..self.row_width {
            row.push(self.store.get(self.cursor));
            self.cursor = (self.cursor + 1) % self.capacity;
        }
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<S: SlotStore> ExactSizeIterator for ReplayRows<'_, S> {}
