use super::SlotStore;
use crate::codec::Slot;

/// Ring buffer of slots backed by a fixed array
///
/// Appends land at `writes % N`, so once `N` slots have been written every
/// append overwrites the chronologically oldest cell.
///
/// ## Memory Usage
///
/// `N × 4` bytes plus the write counter, all inline. Put large stores in a
/// `static` (or PSRAM) rather than on the stack.
#[derive(Debug, Clone)]
pub struct RingStore<const N: usize> {
    cells: [Slot; N],
    /// Total slots ever appended since the last clear
    writes: u64,
}

impl<const N: usize> RingStore<N> {
    pub const fn new() -> Self {
        Self {
            cells: [0; N],
            writes: 0,
        }
    }

    /// Total slots appended since construction or the last clear
    pub const fn writes(&self) -> u64 {
        self.writes
    }

    /// Number of cells currently holding written data
    pub fn len(&self) -> usize {
        self.writes.min(N as u64) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.writes == 0
    }

    /// Whether at least one cell has been overwritten
    pub fn has_wrapped(&self) -> bool {
        self.writes > N as u64
    }
}

impl<const N: usize> Default for RingStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SlotStore for RingStore<N> {
    fn append(&mut self, value: Slot) {
        if N == 0 {
            return;
        }
        let index = (self.writes % N as u64) as usize;
        self.cells[index] = value;
        self.writes += 1;
    }

    fn get(&self, index: usize) -> Slot {
        self.cells[index]
    }

    fn capacity(&self) -> usize {
        N
    }

    fn clear(&mut self) {
        self.cells = [0; N];
        self.writes = 0;
    }
}
