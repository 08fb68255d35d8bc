use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use super::{Recorder, RecorderResult};
use crate::clock::Clock;
use crate::codec::ColumnValue;
use crate::sink::DurableSink;
use crate::storage::SlotStore;

/// Recorder guarded by a critical section
///
/// Each public operation runs to completion inside one critical section, so
/// log calls from an interrupt handler never interleave with a configure or a
/// flush running in the main loop.
///
/// ```rust,ignore
/// static RECORDER: StaticCell<SharedRecorder<RingStore<4096>, EmbassyClock>> = StaticCell::new();
/// let recorder = RECORDER.init(SharedRecorder::new(Recorder::new(RingStore::new(), EmbassyClock)));
/// ```
pub struct SharedRecorder<S, C> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Recorder<S, C>>>,
}

impl<S, C> SharedRecorder<S, C> {
    pub const fn new(recorder: Recorder<S, C>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(recorder)),
        }
    }
}

impl<S: SlotStore, C: Clock> SharedRecorder<S, C> {
    /// Run `f` with exclusive access to the recorder
    ///
    /// `f` must not call back into the same `SharedRecorder`.
    pub fn with<R>(&self, f: impl FnOnce(&mut Recorder<S, C>) -> R) -> R {
        self.inner.lock(|cell| f(&mut *cell.borrow_mut()))
    }

    pub fn configure(&self, names: &[&str]) -> RecorderResult<()> {
        self.with(|recorder| recorder.configure(names))
    }

    pub fn log_row(&self, values: &[ColumnValue<'_>]) -> RecorderResult<()> {
        self.with(|recorder| recorder.log_row(values))
    }

    /// Flush inside the critical section; keep sinks fast or flush from a
    /// context where blocking interrupts is acceptable
    pub fn flush<K: DurableSink + ?Sized>(&self, sink: &mut K) -> RecorderResult<usize> {
        self.with(|recorder| recorder.flush(sink))
    }

    pub fn inserted_rows(&self) -> u64 {
        self.with(|recorder| recorder.inserted_rows())
    }

    pub fn stored_rows(&self) -> usize {
        self.with(|recorder| recorder.stored_rows())
    }
}
