//! Circular slot storage
//!
//! The recorder never owns a copy of the history. It only computes physical
//! indices into a store that silently overwrites its oldest cell once full.

mod ring;

pub use ring::RingStore;

use crate::codec::Slot;

/// Fixed-capacity circular store of numeric slots
pub trait SlotStore {
    /// Append one slot, overwriting the oldest cell when the store is full
    fn append(&mut self, value: Slot);

    /// Read the slot at physical index `index` (`0..capacity()`)
    fn get(&self, index: usize) -> Slot;

    /// Total number of cells, fixed at construction
    fn capacity(&self) -> usize;

    /// Forget everything written so far
    fn clear(&mut self);
}
