//! Recorder configuration
//!
//! Small enough to keep in a flash page; persisted with `postcard`.

use alloc::vec::Vec;

use log::error;
use serde::{Deserialize, Serialize};

use crate::recorder::{RecorderError, RecorderResult};

/// Default cap on the number of columns in a schema
pub const DEFAULT_MAX_COLUMNS: usize = 10;

/// Wall-clock timestamp column a sink may add on its own
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampMode {
    /// No sink timestamps; rows carry the recorder's `time(ms)` column only
    #[default]
    None,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Maximum number of columns a schema may declare
    pub max_columns: usize,
    /// Timestamp mode requested from the sink on every flush
    pub timestamp_mode: TimestampMode,
    /// Whether a flush also resets the sink's own settings when clearing it
    pub reset_sink_config: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_columns: DEFAULT_MAX_COLUMNS,
            timestamp_mode: TimestampMode::None,
            reset_sink_config: true,
        }
    }
}

impl RecorderConfig {
    pub fn validate(&self) -> RecorderResult<()> {
        if self.max_columns == 0 {
            return Err(RecorderError::InvalidConfig {
                details: "max_columns must be at least 1",
            });
        }
        Ok(())
    }

    /// Serialize for storage in flash
    pub fn to_bytes(&self) -> RecorderResult<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|e| {
            error!("Failed to serialize recorder config: {:?}", e);
            RecorderError::InvalidConfig {
                details: "serialization failed",
            }
        })
    }

    /// Load a configuration previously written with [`Self::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> RecorderResult<Self> {
        let config: Self = postcard::from_bytes(bytes).map_err(|e| {
            error!("Failed to deserialize recorder config: {:?}", e);
            RecorderError::InvalidConfig {
                details: "malformed config bytes",
            }
        })?;
        config.validate()?;
        Ok(config)
    }
}
