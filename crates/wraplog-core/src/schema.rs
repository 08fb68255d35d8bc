//! Column schema registry
//!
//! The schema fixes the dense slot layout of every row for the lifetime of a
//! recording session: slot 0 holds the time delta, column `i` lives at slot
//! `i + 1`.

use alloc::vec::Vec;

use crate::recorder::{RecorderError, RecorderResult};

/// Longest column name accepted, in bytes
pub const MAX_COLUMN_NAME_LEN: usize = 32;

/// Label of the derived elapsed-time column written ahead of every row
pub const TIME_COLUMN: &str = "time(ms)";

/// Characters that would split or break a field in a CSV export
const FORBIDDEN_NAME_CHARS: [char; 4] = [',', '"', '\r', '\n'];

/// A bounded column name, stored inline
pub type ColumnName = heapless::String<MAX_COLUMN_NAME_LEN>;

/// Ordered set of unique column names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    names: Vec<ColumnName>,
}

impl ColumnSchema {
    /// Validate `names` and build a schema holding at most `max_columns` columns
    pub fn new(names: &[&str], max_columns: usize) -> RecorderResult<Self> {
        if names.is_empty() {
            return Err(RecorderError::InvalidSchema {
                details: "at least one column is required",
            });
        }
        if names.len() > max_columns {
            return Err(RecorderError::InvalidSchema {
                details: "too many columns",
            });
        }

        let mut columns: Vec<ColumnName> = Vec::with_capacity(names.len());
        for name in names {
            if name.is_empty() {
                return Err(RecorderError::InvalidSchema {
                    details: "column names must not be empty",
                });
            }
            if name.contains(FORBIDDEN_NAME_CHARS) {
                return Err(RecorderError::InvalidSchema {
                    details: "column names must not contain commas, quotes or line breaks",
                });
            }
            if *name == TIME_COLUMN {
                return Err(RecorderError::InvalidSchema {
                    details: "column name is reserved for the time column",
                });
            }
            if columns.iter().any(|c| c.as_str() == *name) {
                return Err(RecorderError::InvalidSchema {
                    details: "duplicate column name",
                });
            }

            let mut column = ColumnName::new();
            column
                .push_str(name)
                .map_err(|_| RecorderError::InvalidSchema {
                    details: "column name too long",
                })?;
            columns.push(column);
        }

        Ok(Self { names: columns })
    }

    /// Number of user columns (excluding the time delta slot)
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// A valid schema always holds at least one column
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of slots a single row occupies in the store
    pub fn row_width(&self) -> usize {
        self.names.len() + 1
    }

    /// 0-based position of `name` among the configured columns
    pub fn column_index(&self, name: &str) -> RecorderResult<usize> {
        self.names
            .iter()
            .position(|c| c.as_str() == name)
            .ok_or(RecorderError::UnknownColumn)
    }

    /// Column names in slot order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|c| c.as_str())
    }
}
