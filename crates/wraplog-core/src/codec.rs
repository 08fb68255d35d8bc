//! Row encoding and decoding
//!
//! A logged row is sparse: callers name only the columns they have readings
//! for. In the store every row is dense, `row_width` slots wide:
//!
//! ```text
//! | delta ms | column 0 | column 1 | ... | column K-1 |
//! ```
//!
//! Columns absent from a row are recorded as 0.

use alloc::vec;
use alloc::vec::Vec;

use crate::recorder::{RecorderError, RecorderResult};
use crate::schema::ColumnSchema;

/// One numeric cell of the slot store
pub type Slot = i32;

/// A column and value to record in the next row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnValue<'a> {
    pub column: &'a str,
    pub value: Slot,
}

impl<'a> ColumnValue<'a> {
    pub const fn new(column: &'a str, value: Slot) -> Self {
        Self { column, value }
    }
}

impl<'a> From<(&'a str, Slot)> for ColumnValue<'a> {
    fn from((column, value): (&'a str, Slot)) -> Self {
        Self::new(column, value)
    }
}

/// A row read back out of the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRow<'s> {
    /// Milliseconds since the previous row was logged
    pub time_delta: Slot,
    /// Column values in schema order
    pub values: Vec<(&'s str, Slot)>,
}

/// Elapsed milliseconds between two clock readings
///
/// The first row of a session has no predecessor and gets 0. A clock that
/// stepped backwards yields a negative delta; the result saturates to the
/// slot range.
pub fn time_delta(now_ms: u64, last_ms: Option<u64>) -> Slot {
    match last_ms {
        None => 0,
        Some(last) => {
            let delta = i128::from(now_ms) - i128::from(last);
            delta.clamp(i128::from(Slot::MIN), i128::from(Slot::MAX)) as Slot
        }
    }
}

/// Flatten a sparse row into `schema.row_width()` dense slots
///
/// Fails without side effects when the row is empty, names a column twice, or
/// names a column the schema does not have.
pub fn encode_row(
    schema: &ColumnSchema,
    values: &[ColumnValue<'_>],
    now_ms: u64,
    last_ms: Option<u64>,
) -> RecorderResult<Vec<Slot>> {
    if values.is_empty() {
        return Err(RecorderError::EmptyRow);
    }

    let mut slots = vec![0; schema.row_width()];
    let mut seen = vec![false; schema.len()];

    for cv in values {
        let index = schema.column_index(cv.column)?;
        if seen[index] {
            return Err(RecorderError::DuplicateColumnInRow);
        }
        seen[index] = true;
        slots[index + 1] = cv.value;
    }

    slots[0] = time_delta(now_ms, last_ms);
    Ok(slots)
}

/// Rebuild the named values of one row from its dense slots
///
/// `slots` must be exactly `schema.row_width()` long.
pub fn decode_row<'s>(schema: &'s ColumnSchema, slots: &[Slot]) -> DecodedRow<'s> {
    debug_assert_eq!(slots.len(), schema.row_width());

    DecodedRow {
        time_delta: slots[0],
        values: schema.names().zip(slots[1..].iter().copied()).collect(),
    }
}
