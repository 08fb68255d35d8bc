//! Hardware-independent core library for wraplog
//!
//! This crate contains all platform-agnostic logic for the wraplog telemetry
//! recorder: the column schema, row encoding, the wraparound replay planner,
//! the recorder session and the collaborator traits (slot store, durable sink,
//! clock) together with reference implementations of each.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod clock;
pub mod codec;
pub mod config;
pub mod recorder;
pub mod replay;
pub mod schema;
pub mod sink;
pub mod storage;

pub use clock::{Clock, ManualClock};
#[cfg(feature = "embassy")]
pub use clock::EmbassyClock;
pub use codec::{ColumnValue, DecodedRow, Slot};
pub use config::{RecorderConfig, TimestampMode};
pub use recorder::{Recorder, RecorderError, RecorderResult, ReplayedRow, SharedRecorder};
pub use replay::ReplayPlan;
pub use schema::{ColumnName, ColumnSchema};
pub use sink::{DurableSink, MemorySink, SdCardSink, SinkError};
pub use storage::{RingStore, SlotStore};
