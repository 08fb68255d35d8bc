//! Recorder session
//!
//! A [`Recorder`] owns the session state (schema, inserted-row count, last
//! clock reading) next to the slot store and clock it writes through. Rows are
//! encoded and appended on every [`Recorder::log_row`]; [`Recorder::flush`]
//! plans a replay window over the store and writes the surviving rows, oldest
//! first, to a durable sink.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut recorder = Recorder::new(RingStore::<4096>::new(), EmbassyClock);
//! recorder.configure(&["temp", "light"])?;
//!
//! recorder.log_row(&[ColumnValue::new("temp", 21)])?;
//! recorder.log_row(&[ColumnValue::new("light", 5), ColumnValue::new("temp", 22)])?;
//!
//! recorder.flush(&mut sd_card_sink)?;
//! ```

mod shared;

pub use shared::SharedRecorder;

use core::fmt::Write;

use alloc::vec::Vec;
use log::{debug, info, warn};
use thiserror_no_std::Error;

use crate::clock::Clock;
use crate::codec::{ColumnValue, Slot, decode_row, encode_row};
use crate::config::RecorderConfig;
use crate::replay::ReplayPlan;
use crate::schema::{ColumnSchema, TIME_COLUMN};
use crate::sink::{DurableSink, SinkError};
use crate::storage::SlotStore;

/// Error types for recorder operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecorderError {
    /// Column list rejected by configure
    #[error("Invalid schema: {details}")]
    InvalidSchema { details: &'static str },

    /// A row named a column the schema does not have
    #[error("Unknown column")]
    UnknownColumn,

    /// A row named the same column twice
    #[error("Duplicate column in row")]
    DuplicateColumnInRow,

    /// A row carried no values at all
    #[error("Row has no values")]
    EmptyRow,

    /// Log or flush before any schema was configured
    #[error("Recorder has no schema configured")]
    UninitializedSession,

    #[error("Invalid config: {details}")]
    InvalidConfig { details: &'static str },

    #[error("Sink error: {0}")]
    Sink(SinkError),
}

impl From<SinkError> for RecorderError {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

/// Result type for recorder operations
pub type RecorderResult<T> = Result<T, RecorderError>;

/// A row as written to the sink at flush time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedRow<'s> {
    /// Milliseconds since the oldest replayed row
    pub elapsed_ms: i64,
    /// Milliseconds since the previous logged row, as stored
    pub time_delta: Slot,
    /// Column values in schema order
    pub values: Vec<(&'s str, Slot)>,
}

#[derive(Debug)]
struct Session {
    schema: ColumnSchema,
    inserted_rows: u64,
    last_ms: Option<u64>,
}

pub struct Recorder<S, C> {
    store: S,
    clock: C,
    config: RecorderConfig,
    session: Option<Session>,
}

impl<S: SlotStore, C: Clock> Recorder<S, C> {
    /// Create an unconfigured recorder with the default configuration
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            config: RecorderConfig::default(),
            session: None,
        }
    }

    pub fn with_config(store: S, clock: C, config: RecorderConfig) -> RecorderResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            clock,
            config,
            session: None,
        })
    }

    /// Start a new session with the given columns
    ///
    /// Clears the store and resets the row count and time origin. A rejected
    /// column list leaves the previous session untouched.
    pub fn configure(&mut self, names: &[&str]) -> RecorderResult<()> {
        let schema = ColumnSchema::new(names, self.config.max_columns)?;
        let row_width = schema.row_width();

        self.store.clear();
        self.session = Some(Session {
            schema,
            inserted_rows: 0,
            last_ms: None,
        });

        let max_rows = ReplayPlan::max_storable_rows(self.store.capacity(), row_width);
        if max_rows == 0 {
            warn!(
                "Row width {} exceeds store capacity {}, nothing will be replayed",
                row_width,
                self.store.capacity()
            );
        }
        info!(
            "Configured {} columns (row width {}, {} rows storable)",
            names.len(),
            row_width,
            max_rows
        );
        Ok(())
    }

    /// Timestamp and append one row
    ///
    /// Columns missing from `values` are recorded as 0. On error nothing is
    /// appended and the session is unchanged.
    pub fn log_row(&mut self, values: &[ColumnValue<'_>]) -> RecorderResult<()> {
        let session = self
            .session
            .as_mut()
            .ok_or(RecorderError::UninitializedSession)?;

        let now_ms = self.clock.now_millis();
        let slots = encode_row(&session.schema, values, now_ms, session.last_ms)?;

        for slot in slots.iter().copied() {
            self.store.append(slot);
        }
        session.last_ms = Some(now_ms);
        session.inserted_rows += 1;

        debug!(
            "Logged row {} at {} ms (delta {} ms)",
            session.inserted_rows, now_ms, slots[0]
        );
        Ok(())
    }

    /// Replay window over the store for the current session
    pub fn replay_plan(&self) -> RecorderResult<ReplayPlan> {
        let session = self.session()?;
        Ok(ReplayPlan::new(
            session.inserted_rows,
            self.store.capacity(),
            session.schema.row_width(),
        ))
    }

    /// Surviving rows, oldest first, with elapsed time relative to the first
    pub fn replay(&self) -> RecorderResult<impl Iterator<Item = ReplayedRow<'_>>> {
        let session = self.session()?;
        let plan = self.replay_plan()?;
        let schema = &session.schema;

        let mut elapsed_ms: i64 = 0;
        Ok(plan
            .rows(&self.store)
            .enumerate()
            .map(move |(i, slots)| {
                let decoded = decode_row(schema, &slots);
                // The oldest row is the time origin, whatever its stored delta.
                if i > 0 {
                    elapsed_ms += i64::from(decoded.time_delta);
                }
                ReplayedRow {
                    elapsed_ms,
                    time_delta: decoded.time_delta,
                    values: decoded.values,
                }
            }))
    }

    /// Write the header and every surviving row to `sink`
    ///
    /// Returns the number of data rows written. A store too small for a single
    /// row yields a header only.
    pub fn flush<K: DurableSink + ?Sized>(&self, sink: &mut K) -> RecorderResult<usize> {
        let session = self.session()?;
        let plan = self.replay_plan()?;

        sink.clear(self.config.reset_sink_config)?;
        sink.set_timestamp_mode(self.config.timestamp_mode)?;

        sink.begin_row()?;
        sink.log_field(TIME_COLUMN, "")?;
        for name in session.schema.names() {
            sink.log_field(name, "")?;
        }
        sink.end_row()?;

        if plan.is_degenerate() && session.inserted_rows > 0 {
            warn!(
                "Store of {} slots cannot hold a {}-slot row, flushing header only",
                plan.capacity, plan.row_width
            );
        }

        let mut written = 0;
        for row in self.replay()? {
            sink.begin_row()?;
            sink.log_field(TIME_COLUMN, &format_number(row.elapsed_ms))?;
            for (name, value) in row.values {
                sink.log_field(name, &format_number(i64::from(value)))?;
            }
            sink.end_row()?;
            written += 1;
        }

        info!(
            "Flushed {} of {} rows ({} overwritten)",
            written, session.inserted_rows, plan.overwritten_rows
        );
        Ok(written)
    }

    /// Current schema, if configured
    pub fn schema(&self) -> Option<&ColumnSchema> {
        self.session.as_ref().map(|s| &s.schema)
    }

    /// Rows logged since the last configure
    pub fn inserted_rows(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.inserted_rows)
    }

    /// Rows still held by the store
    pub fn stored_rows(&self) -> usize {
        self.replay_plan().map_or(0, |plan| plan.rows)
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn session(&self) -> RecorderResult<&Session> {
        self.session
            .as_ref()
            .ok_or(RecorderError::UninitializedSession)
    }
}

fn format_number(value: i64) -> heapless::String<24> {
    let mut s = heapless::String::new();
    // 20 characters cover i64::MIN
    let _ = write!(s, "{}", value);
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::TimestampMode;
    use crate::sink::MemorySink;
    use crate::storage::RingStore;

    fn cv(column: &str, value: Slot) -> ColumnValue<'_> {
        ColumnValue::new(column, value)
    }

    #[test]
    fn test_uninitialized_session() {
        let mut recorder = Recorder::new(RingStore::<9>::new(), ManualClock::new(0));
        let mut sink = MemorySink::new();

        assert_eq!(
            recorder.log_row(&[cv("temp", 1)]),
            Err(RecorderError::UninitializedSession)
        );
        assert_eq!(
            recorder.flush(&mut sink),
            Err(RecorderError::UninitializedSession)
        );
        assert!(recorder.replay().is_err());
        assert_eq!(recorder.inserted_rows(), 0);
        assert_eq!(sink.clears(), 0);
    }

    #[test]
    fn test_counts_every_logged_row() {
        let clock = ManualClock::new(0);
        let mut recorder = Recorder::new(RingStore::<64>::new(), &clock);
        recorder.configure(&["a", "b", "c"]).unwrap();

        for i in 0..25 {
            clock.advance(10);
            let row: &[ColumnValue<'_>] = match i % 3 {
                0 => &[cv("a", i)],
                1 => &[cv("b", i), cv("c", -i)],
                _ => &[cv("c", i), cv("a", 1), cv("b", 2)],
            };
            recorder.log_row(row).unwrap();
        }

        assert_eq!(recorder.inserted_rows(), 25);
        assert_eq!(recorder.stored_rows(), 16);
        assert_eq!(recorder.store().writes(), 100);
    }

    #[test]
    fn test_failed_log_leaves_state_untouched() {
        let clock = ManualClock::new(1_000);
        let mut recorder = Recorder::new(RingStore::<9>::new(), &clock);
        recorder.configure(&["temp", "light"]).unwrap();
        recorder.log_row(&[cv("temp", 20)]).unwrap();

        clock.set(1_500);
        assert_eq!(
            recorder.log_row(&[cv("temp", 21), cv("humidity", 3)]),
            Err(RecorderError::UnknownColumn)
        );
        assert_eq!(
            recorder.log_row(&[cv("light", 1), cv("light", 2)]),
            Err(RecorderError::DuplicateColumnInRow)
        );
        assert_eq!(recorder.log_row(&[]), Err(RecorderError::EmptyRow));

        assert_eq!(recorder.inserted_rows(), 1);
        assert_eq!(recorder.store().writes(), 3);

        // The delta is still measured from the last successful row
        clock.set(1_800);
        recorder.log_row(&[cv("light", 9)]).unwrap();
        let rows: Vec<ReplayedRow<'_>> = recorder.replay().unwrap().collect();
        assert_eq!(rows[1].time_delta, 800);
    }

    #[test]
    fn test_round_trip_without_wrap() {
        let clock = ManualClock::new(5);
        let mut recorder = Recorder::new(RingStore::<32>::new(), &clock);
        recorder.configure(&["x", "y"]).unwrap();

        let rows: [&[ColumnValue<'_>]; 4] = [
            &[cv("x", 1)],
            &[cv("y", 2), cv("x", 3)],
            &[cv("y", -4)],
            &[cv("x", 5), cv("y", 6)],
        ];
        let times = [5, 17, 17, 60];
        for (row, t) in rows.iter().zip(times) {
            clock.set(t);
            recorder.log_row(row).unwrap();
        }

        let replayed: Vec<ReplayedRow<'_>> = recorder.replay().unwrap().collect();
        assert_eq!(replayed.len(), 4);

        let deltas: Vec<Slot> = replayed.iter().map(|r| r.time_delta).collect();
        assert_eq!(deltas, [0, 12, 0, 43]);
        let elapsed: Vec<i64> = replayed.iter().map(|r| r.elapsed_ms).collect();
        assert_eq!(elapsed, [0, 12, 12, 55]);

        assert_eq!(replayed[0].values, [("x", 1), ("y", 0)]);
        assert_eq!(replayed[1].values, [("x", 3), ("y", 2)]);
        assert_eq!(replayed[2].values, [("x", 0), ("y", -4)]);
        assert_eq!(replayed[3].values, [("x", 5), ("y", 6)]);
    }

    #[test]
    fn test_wraparound_scenario() {
        let clock = ManualClock::new(0);
        let mut recorder = Recorder::new(RingStore::<9>::new(), &clock);
        recorder.configure(&["temp", "light"]).unwrap();

        recorder.log_row(&[cv("temp", 20)]).unwrap();
        clock.set(100);
        recorder.log_row(&[cv("temp", 21), cv("light", 5)]).unwrap();
        clock.set(250);
        recorder.log_row(&[cv("light", 6)]).unwrap();
        clock.set(400);
        recorder.log_row(&[cv("temp", 22)]).unwrap();

        assert_eq!(recorder.inserted_rows(), 4);
        let plan = recorder.replay_plan().unwrap();
        assert!(plan.is_wrapped());
        assert_eq!(plan.start_slot, 3);

        let mut sink = MemorySink::new();
        assert_eq!(recorder.flush(&mut sink), Ok(3));

        let header = &sink.rows()[0];
        let names: Vec<&str> = header.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["time(ms)", "temp", "light"]);
        assert!(header.iter().all(|(_, v)| v.is_empty()));

        assert_eq!(sink.data_rows().len(), 3);
        let expected = [("0", "21", "5"), ("150", "0", "6"), ("300", "22", "0")];
        for (i, (time, temp, light)) in expected.iter().enumerate() {
            assert_eq!(sink.field(i + 1, "time(ms)"), Some(*time));
            assert_eq!(sink.field(i + 1, "temp"), Some(*temp));
            assert_eq!(sink.field(i + 1, "light"), Some(*light));
        }
    }

    #[test]
    fn test_wraparound_with_slack_keeps_latest_rows() {
        let clock = ManualClock::new(0);
        // width 4 into 14 cells: 3 rows and 2 cells of slack
        let mut recorder = Recorder::new(RingStore::<14>::new(), &clock);
        recorder.configure(&["a", "b", "c"]).unwrap();

        for i in 0..11 {
            clock.advance(10 + i as u64);
            recorder.log_row(&[cv("a", i), cv("c", i * 2)]).unwrap();
        }

        let rows: Vec<ReplayedRow<'_>> = recorder.replay().unwrap().collect();
        assert_eq!(rows.len(), 3);
        let a: Vec<Slot> = rows.iter().map(|r| r.values[0].1).collect();
        assert_eq!(a, [8, 9, 10]);
        assert_eq!(rows[2].values, [("a", 10), ("b", 0), ("c", 20)]);

        let elapsed: Vec<i64> = rows.iter().map(|r| r.elapsed_ms).collect();
        assert_eq!(elapsed, [0, 19, 39]);
    }

    #[test]
    fn test_degenerate_capacity_flushes_header_only() {
        let mut recorder = Recorder::new(RingStore::<2>::new(), ManualClock::new(0));
        recorder.configure(&["a", "b"]).unwrap();
        recorder.log_row(&[cv("a", 1)]).unwrap();

        let mut sink = MemorySink::new();
        assert_eq!(recorder.flush(&mut sink), Ok(0));
        assert_eq!(sink.rows().len(), 1);
        assert_eq!(recorder.stored_rows(), 0);
    }

    #[test]
    fn test_flush_with_no_rows() {
        let mut recorder = Recorder::new(RingStore::<9>::new(), ManualClock::new(0));
        recorder.configure(&["a"]).unwrap();

        let mut sink = MemorySink::new();
        assert_eq!(recorder.flush(&mut sink), Ok(0));
        assert_eq!(sink.rows().len(), 1);
        assert_eq!(sink.timestamp_mode(), Some(TimestampMode::None));
    }

    #[test]
    fn test_flush_replaces_previous_export() {
        let mut recorder = Recorder::new(RingStore::<9>::new(), ManualClock::new(0));
        recorder.configure(&["a"]).unwrap();
        recorder.log_row(&[cv("a", 1)]).unwrap();

        let mut sink = MemorySink::new();
        recorder.flush(&mut sink).unwrap();
        recorder.log_row(&[cv("a", 2)]).unwrap();
        recorder.flush(&mut sink).unwrap();

        assert_eq!(sink.clears(), 2);
        assert_eq!(sink.data_rows().len(), 2);
    }

    #[test]
    fn test_reconfigure_resets_session() {
        let clock = ManualClock::new(0);
        let mut recorder = Recorder::new(RingStore::<9>::new(), &clock);
        recorder.configure(&["a"]).unwrap();
        recorder.log_row(&[cv("a", 1)]).unwrap();
        clock.set(70);
        recorder.log_row(&[cv("a", 2)]).unwrap();

        recorder.configure(&["b", "c"]).unwrap();
        assert_eq!(recorder.inserted_rows(), 0);
        assert!(recorder.store().is_empty());

        clock.set(500);
        recorder.log_row(&[cv("c", 3)]).unwrap();
        let rows: Vec<ReplayedRow<'_>> = recorder.replay().unwrap().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].time_delta, 0);
        assert_eq!(rows[0].values, [("b", 0), ("c", 3)]);
    }

    #[test]
    fn test_rejected_configure_keeps_previous_session() {
        let mut recorder = Recorder::new(RingStore::<9>::new(), ManualClock::new(0));
        recorder.configure(&["a"]).unwrap();
        recorder.log_row(&[cv("a", 1)]).unwrap();

        assert!(matches!(
            recorder.configure(&["x", "x"]),
            Err(RecorderError::InvalidSchema { .. })
        ));
        assert_eq!(recorder.inserted_rows(), 1);
        assert_eq!(recorder.schema().unwrap().column_index("a"), Ok(0));
    }

    #[test]
    fn test_config_limits_columns() {
        let config = RecorderConfig {
            max_columns: 2,
            timestamp_mode: TimestampMode::Milliseconds,
            reset_sink_config: false,
        };
        let mut recorder =
            Recorder::with_config(RingStore::<9>::new(), ManualClock::new(0), config).unwrap();

        assert!(recorder.configure(&["a", "b", "c"]).is_err());
        recorder.configure(&["a", "b"]).unwrap();

        let mut sink = MemorySink::new();
        recorder.flush(&mut sink).unwrap();
        assert_eq!(sink.timestamp_mode(), Some(TimestampMode::Milliseconds));

        let zero = RecorderConfig {
            max_columns: 0,
            ..config
        };
        assert!(Recorder::with_config(RingStore::<9>::new(), ManualClock::new(0), zero).is_err());
    }

    #[test]
    fn test_backwards_clock_gives_negative_delta() {
        let clock = ManualClock::new(1_000);
        let mut recorder = Recorder::new(RingStore::<16>::new(), &clock);
        recorder.configure(&["a"]).unwrap();

        recorder.log_row(&[cv("a", 1)]).unwrap();
        clock.set(900);
        recorder.log_row(&[cv("a", 2)]).unwrap();

        let rows: Vec<ReplayedRow<'_>> = recorder.replay().unwrap().collect();
        assert_eq!(rows[1].time_delta, -100);
        assert_eq!(rows[1].elapsed_ms, -100);
    }

    struct FailingSink;

    impl DurableSink for FailingSink {
        fn clear(&mut self, _reset_config: bool) -> Result<(), SinkError> {
            Ok(())
        }

        fn set_timestamp_mode(&mut self, _mode: TimestampMode) -> Result<(), SinkError> {
            Ok(())
        }

        fn begin_row(&mut self) -> Result<(), SinkError> {
            Err(SinkError::Full)
        }

        fn log_field(&mut self, _name: &str, _value: &str) -> Result<(), SinkError> {
            Ok(())
        }

        fn end_row(&mut self) -> Result<(), SinkError> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_errors_propagate() {
        let mut recorder = Recorder::new(RingStore::<9>::new(), ManualClock::new(0));
        recorder.configure(&["a"]).unwrap();

        assert_eq!(
            recorder.flush(&mut FailingSink),
            Err(RecorderError::Sink(SinkError::Full))
        );
    }
}
