//! Desktop simulator for the wraplog telemetry recorder.
//!
//! Drives a [`SharedRecorder`] with synthetic sensor rows on a simulated
//! clock, then flushes the surviving rows as CSV to stdout. Progress is logged
//! to stderr through `env_logger` (`RUST_LOG=debug` shows every row).
//!
//! # Usage
//!
//! ```text
//! wraplog-simulator [ROWS]
//! ```
//!
//! `ROWS` defaults to [`DEFAULT_ROWS`], enough to wrap the store several times.

use std::io::{self, BufWriter, Stdout, Write};

use log::{error, info, warn};

use wraplog_core::sink::{CsvLine, Line};
use wraplog_core::{
    ColumnValue, DurableSink, ManualClock, Recorder, RecorderError, RingStore, SharedRecorder,
    SinkError, TimestampMode,
};

// ---------------------------------------------------------------------------
// Recorder constants
// ---------------------------------------------------------------------------

/// Slots in the simulated store (4-byte cells).
const STORE_SLOTS: usize = 1024;

/// Columns logged by the simulated device.
const COLUMNS: [&str; 4] = ["temp", "humidity", "co2", "light"];

/// Rows logged when no count is given on the command line.
const DEFAULT_ROWS: u64 = 1000;

/// Nominal interval between rows on the simulated clock.
const SAMPLE_INTERVAL_MS: u64 = 250;

/// CO₂ is only measured every n-th row.
const CO2_EVERY: u64 = 5;

// ---------------------------------------------------------------------------
// Mock data generation
// ---------------------------------------------------------------------------

/// Generates synthetic sensor readings that vary over time.
struct MockSensorGenerator {
    /// Rows generated so far
    count: u64,
}

impl MockSensorGenerator {
    fn new() -> Self {
        Self { count: 0 }
    }

    /// Jittered delay until the next row, in milliseconds.
    fn next_interval(&self) -> u64 {
        SAMPLE_INTERVAL_MS + (self.count * 37) % 60
    }

    /// Produce the next partial row. Values are in milli-units.
    fn next_row(&mut self) -> Vec<ColumnValue<'static>> {
        let t = self.count as f64;
        self.count += 1;

        // Temperature: 20–26 °C sinusoidal with slow drift
        let temperature = 23.0 + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos();
        // Humidity: 40–60 % with different period
        let humidity = 50.0 + 10.0 * (t / 180.0).sin() + 2.0 * (t / 23.0).cos();
        // Light: 0–1000 lux, clipped at night
        let light = (500.0 * (t / 400.0).sin() + 300.0).max(0.0);

        let mut row = vec![
            ColumnValue::new("temp", (temperature * 1000.0) as i32),
            ColumnValue::new("humidity", (humidity * 1000.0) as i32),
        ];
        if self.count % CO2_EVERY == 0 {
            // CO₂: 400–800 ppm with a longer cycle
            let co2 = 600.0 + 200.0 * (t / 300.0).sin() + 30.0 * (t / 41.0).cos();
            row.push(ColumnValue::new("co2", (co2 * 1000.0) as i32));
        }
        if light > 0.0 {
            row.push(ColumnValue::new("light", light as i32));
        }
        row
    }
}

// ---------------------------------------------------------------------------
// CSV sink
// ---------------------------------------------------------------------------

/// Durable sink writing CSV lines to any `io::Write`.
struct CsvSink<W: Write> {
    out: W,
    csv: CsvLine,
}

impl CsvSink<BufWriter<Stdout>> {
    fn stdout() -> Self {
        Self::new(BufWriter::new(io::stdout()))
    }
}

impl<W: Write> CsvSink<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            csv: CsvLine::new(),
        }
    }

    fn write_line(&mut self, line: &Line) -> Result<(), SinkError> {
        self.out.write_all(line.as_bytes()).map_err(|e| {
            error!("Failed to write CSV line: {e}");
            SinkError::Io {
                operation: "write csv line",
            }
        })
    }
}

impl<W: Write> DurableSink for CsvSink<W> {
    fn clear(&mut self, _reset_config: bool) -> Result<(), SinkError> {
        self.csv.reset();
        Ok(())
    }

    fn set_timestamp_mode(&mut self, mode: TimestampMode) -> Result<(), SinkError> {
        if mode != TimestampMode::None {
            warn!("CSV sink does not add wall-clock timestamps, ignoring {mode:?}");
        }
        Ok(())
    }

    fn begin_row(&mut self) -> Result<(), SinkError> {
        self.csv.begin()
    }

    fn log_field(&mut self, name: &str, value: &str) -> Result<(), SinkError> {
        self.csv.field(name, value)
    }

    fn end_row(&mut self) -> Result<(), SinkError> {
        let lines = self.csv.end()?;
        if let Some(header) = lines.header {
            self.write_line(&header)?;
        }
        if let Some(data) = lines.data {
            self.write_line(&data)?;
        }
        self.out.flush().map_err(|_| SinkError::Io {
            operation: "flush stdout",
        })
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let rows = match std::env::args().nth(1).map(|arg| arg.parse::<u64>()) {
        None => DEFAULT_ROWS,
        Some(Ok(rows)) => rows,
        Some(Err(e)) => {
            error!("Invalid row count: {e}");
            std::process::exit(2);
        }
    };

    info!("Starting wraplog simulator");
    info!(
        "Store: {} slots, columns: {}, rows to log: {}",
        STORE_SLOTS,
        COLUMNS.join(", "),
        rows
    );

    if let Err(e) = run(rows) {
        error!("Simulation failed: {e}");
        std::process::exit(1);
    }
}

fn run(rows: u64) -> Result<(), RecorderError> {
    let recorder = SharedRecorder::new(Recorder::new(
        RingStore::<STORE_SLOTS>::new(),
        ManualClock::new(0),
    ));
    recorder.configure(&COLUMNS)?;

    let mut sensor_gen = MockSensorGenerator::new();
    for _ in 0..rows {
        let interval = sensor_gen.next_interval();
        let row = sensor_gen.next_row();
        recorder.with(|r| {
            r.clock().advance(interval);
            r.log_row(&row)
        })?;
    }

    info!(
        "Logged {} rows, {} still stored",
        recorder.inserted_rows(),
        recorder.stored_rows()
    );

    let written = recorder.flush(&mut CsvSink::stdout())?;
    info!("Wrote {written} rows to stdout");
    Ok(())
}
