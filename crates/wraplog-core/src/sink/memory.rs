use alloc::string::{String, ToString};
use alloc::vec::Vec;

use super::{DurableSink, SinkError};
use crate::config::TimestampMode;

/// One completed row as (field name, value) pairs in write order
pub type SinkRow = Vec<(String, String)>;

/// Sink that keeps every row in RAM
///
/// Used by host tests and the simulator; on a device it is only useful for
/// small exports.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Vec<SinkRow>,
    current: Option<SinkRow>,
    timestamp_mode: Option<TimestampMode>,
    clears: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed rows, header included
    pub fn rows(&self) -> &[SinkRow] {
        &self.rows
    }

    /// Completed data rows, skipping the header
    pub fn data_rows(&self) -> &[SinkRow] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Value of `field` in completed row `row`
    pub fn field(&self, row: usize, field: &str) -> Option<&str> {
        self.rows
            .get(row)?
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn timestamp_mode(&self) -> Option<TimestampMode> {
        self.timestamp_mode
    }

    /// Number of times the sink was cleared
    pub fn clears(&self) -> usize {
        self.clears
    }
}

impl DurableSink for MemorySink {
    fn clear(&mut self, reset_config: bool) -> Result<(), SinkError> {
        self.rows.clear();
        self.current = None;
        if reset_config {
            self.timestamp_mode = None;
        }
        self.clears += 1;
        Ok(())
    }

    fn set_timestamp_mode(&mut self, mode: TimestampMode) -> Result<(), SinkError> {
        self.timestamp_mode = Some(mode);
        Ok(())
    }

    fn begin_row(&mut self) -> Result<(), SinkError> {
        if self.current.is_some() {
            return Err(SinkError::Protocol {
                details: "row already open",
            });
        }
        self.current = Some(Vec::new());
        Ok(())
    }

    fn log_field(&mut self, name: &str, value: &str) -> Result<(), SinkError> {
        let row = self.current.as_mut().ok_or(SinkError::Protocol {
            details: "field written outside of a row",
        })?;
        row.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn end_row(&mut self) -> Result<(), SinkError> {
        let row = self.current.take().ok_or(SinkError::Protocol {
            details: "no open row",
        })?;
        self.rows.push(row);
        Ok(())
    }
}
