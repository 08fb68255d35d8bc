//! Durable sinks that receive replayed rows at flush time

mod csv;
mod memory;
mod sd_card;

pub use csv::{CsvLine, CsvLines, LINE_CAPACITY, Line};
pub use memory::{MemorySink, SinkRow};
pub use sd_card::{SD_LOG_FILE, SdCardSink};

use thiserror_no_std::Error;

use crate::config::TimestampMode;

/// Errors reported by a durable sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The backing medium could not be reached
    #[error("Sink unavailable: {details}")]
    Unavailable { details: &'static str },

    /// A read or write against the medium failed
    #[error("Sink I/O failed during {operation}")]
    Io { operation: &'static str },

    /// The sink ran out of space for the row
    #[error("Sink is full")]
    Full,

    /// Calls arrived out of order (e.g. a field outside of a row)
    #[error("Sink protocol violation: {details}")]
    Protocol { details: &'static str },
}

/// Row-oriented persistence target
///
/// A flush drives it in a fixed sequence: `clear`, `set_timestamp_mode`, then
/// one `begin_row` / `log_field`... / `end_row` group per row, header first.
pub trait DurableSink {
    /// Drop all previously persisted rows, optionally resetting sink settings
    fn clear(&mut self, reset_config: bool) -> Result<(), SinkError>;

    /// Choose whether the sink adds its own wall-clock column
    fn set_timestamp_mode(&mut self, mode: TimestampMode) -> Result<(), SinkError>;

    fn begin_row(&mut self) -> Result<(), SinkError>;

    /// Write one named field of the current row
    fn log_field(&mut self, name: &str, value: &str) -> Result<(), SinkError>;

    fn end_row(&mut self) -> Result<(), SinkError>;
}
