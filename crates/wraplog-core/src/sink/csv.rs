//! CSV line assembly shared by the file-backed sinks
//!
//! Fields are joined with bare commas; the schema rejects column names that
//! would need quoting. The first row after a reset becomes the header (its
//! field names), any later row contributes its field values. A header row whose
//! values are all empty yields no data line.

use core::fmt::Write;

use super::SinkError;

/// Longest CSV line buffered for a single row, terminator included
pub const LINE_CAPACITY: usize = 512;

pub type Line = heapless::String<LINE_CAPACITY>;

/// Lines produced by closing a row, in the order they must be written
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CsvLines {
    pub header: Option<Line>,
    pub data: Option<Line>,
}

/// Builds one CSV row at a time from `begin` / `field` / `end` calls
#[derive(Debug, Default)]
pub struct CsvLine {
    names: Line,
    values: Line,
    has_values: bool,
    in_row: bool,
    header_written: bool,
}

impl CsvLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget any open row; the next row is a header again
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn header_written(&self) -> bool {
        self.header_written
    }

    pub fn begin(&mut self) -> Result<(), SinkError> {
        if self.in_row {
            return Err(SinkError::Protocol {
                details: "row already open",
            });
        }
        self.names.clear();
        self.values.clear();
        self.has_values = false;
        self.in_row = true;
        Ok(())
    }

    pub fn field(&mut self, name: &str, value: &str) -> Result<(), SinkError> {
        if !self.in_row {
            return Err(SinkError::Protocol {
                details: "field written outside of a row",
            });
        }
        push_field(&mut self.names, name)?;
        push_field(&mut self.values, value)?;
        self.has_values |= !value.is_empty();
        Ok(())
    }

    /// Close the row and hand back the lines to append
    pub fn end(&mut self) -> Result<CsvLines, SinkError> {
        if !self.in_row {
            return Err(SinkError::Protocol {
                details: "no open row",
            });
        }
        self.in_row = false;

        let mut lines = CsvLines::default();
        if !self.header_written {
            let mut header = core::mem::take(&mut self.names);
            finish_line(&mut header)?;
            lines.header = Some(header);
            self.header_written = true;

            if !self.has_values {
                return Ok(lines);
            }
        }

        let mut data = core::mem::take(&mut self.values);
        finish_line(&mut data)?;
        lines.data = Some(data);
        Ok(lines)
    }
}

fn push_field(line: &mut Line, field: &str) -> Result<(), SinkError> {
    if !line.is_empty() {
        line.push(',').map_err(|_| SinkError::Full)?;
    }
    line.push_str(field).map_err(|_| SinkError::Full)
}

fn finish_line(line: &mut Line) -> Result<(), SinkError> {
    line.write_str("\r\n").map_err(|_| SinkError::Full)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(csv: &mut CsvLine, fields: &[(&str, &str)]) -> Result<CsvLines, SinkError> {
        csv.begin()?;
        for (name, value) in fields {
            csv.field(name, value)?;
        }
        csv.end()
    }

    #[test]
    fn test_header_row_has_no_data_line() {
        let mut csv = CsvLine::new();

        let lines = row(&mut csv, &[("time(ms)", ""), ("temp", ""), ("light", "")]).unwrap();
        assert_eq!(lines.header.as_deref(), Some("time(ms),temp,light\r\n"));
        assert_eq!(lines.data, None);
        assert!(csv.header_written());

        let lines = row(&mut csv, &[("time(ms)", "0"), ("temp", "21"), ("light", "")]).unwrap();
        assert_eq!(lines.header, None);
        assert_eq!(lines.data.as_deref(), Some("0,21,\r\n"));
    }

    #[test]
    fn test_single_column_header() {
        let mut csv = CsvLine::new();
        let lines = row(&mut csv, &[("time(ms)", "")]).unwrap();
        assert_eq!(lines.header.as_deref(), Some("time(ms)\r\n"));
        assert_eq!(lines.data, None);
    }

    #[test]
    fn test_first_row_with_values_keeps_them() {
        let mut csv = CsvLine::new();
        let lines = row(&mut csv, &[("a", "1"), ("b", "")]).unwrap();
        assert_eq!(lines.header.as_deref(), Some("a,b\r\n"));
        assert_eq!(lines.data.as_deref(), Some("1,\r\n"));
    }

    #[test]
    fn test_reset_starts_a_new_header() {
        let mut csv = CsvLine::new();
        row(&mut csv, &[("a", "")]).unwrap();
        csv.begin().unwrap();

        csv.reset();
        assert!(!csv.header_written());
        let lines = row(&mut csv, &[("b", "")]).unwrap();
        assert_eq!(lines.header.as_deref(), Some("b\r\n"));
    }

    #[test]
    fn test_line_overflow() {
        let mut csv = CsvLine::new();
        let long = "9".repeat(LINE_CAPACITY + 1);
        csv.begin().unwrap();
        assert_eq!(csv.field("a", &long), Err(SinkError::Full));

        // Content that fits but leaves no room for the terminator
        let mut csv = CsvLine::new();
        let exact = "x".repeat(LINE_CAPACITY - 1);
        assert_eq!(row(&mut csv, &[(exact.as_str(), "")]), Err(SinkError::Full));

        let mut csv = CsvLine::new();
        let fits = "x".repeat(LINE_CAPACITY - 2);
        let lines = row(&mut csv, &[(fits.as_str(), "")]).unwrap();
        assert_eq!(lines.header.map(|l| l.len()), Some(LINE_CAPACITY));
    }

    #[test]
    fn test_rejects_out_of_order_calls() {
        let mut csv = CsvLine::new();
        assert!(matches!(
            csv.field("a", "1"),
            Err(SinkError::Protocol { .. })
        ));
        assert!(matches!(csv.end(), Err(SinkError::Protocol { .. })));

        csv.begin().unwrap();
        assert!(matches!(csv.begin(), Err(SinkError::Protocol { .. })));
    }
}
