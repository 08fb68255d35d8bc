use embedded_sdmmc::{Mode, SdCard, SdCardError, TimeSource, VolumeIdx, VolumeManager};
use log::{debug, error};

use super::csv::{CsvLine, Line};
use super::{DurableSink, SinkError};
use crate::config::TimestampMode;

/// CSV file the flushed rows are written to (8.3 name)
pub const SD_LOG_FILE: &str = "wraplog.csv";

/// Sink that writes rows as CSV lines to a file on the SD card
///
/// Rows are assembled in RAM by [`CsvLine`] and appended in one write on
/// `end_row`; the first row after a clear becomes the CSV header.
///
/// The SD card operations are blocking, as are the other users of the SPI bus.
pub struct SdCardSink<S, D, T>
where
    S: embedded_hal::spi::SpiDevice<u8>,
    D: embedded_hal::delay::DelayNs,
    T: TimeSource,
{
    volume_mgr: VolumeManager<SdCard<S, D>, T, 4, 4, 1>,
    file_name: &'static str,
    csv: CsvLine,
    timestamp_mode: TimestampMode,
}

impl<S, D, T> SdCardSink<S, D, T>
where
    S: embedded_hal::spi::SpiDevice<u8>,
    D: embedded_hal::delay::DelayNs,
    T: TimeSource,
{
    /// Create a sink writing to [`SD_LOG_FILE`]
    pub fn new(sd_card: SdCard<S, D>, ts: T) -> Self {
        Self::with_file(sd_card, ts, SD_LOG_FILE)
    }

    pub fn with_file(sd_card: SdCard<S, D>, ts: T, file_name: &'static str) -> Self {
        Self {
            volume_mgr: VolumeManager::new(sd_card, ts),
            file_name,
            csv: CsvLine::new(),
            timestamp_mode: TimestampMode::None,
        }
    }

    pub fn timestamp_mode(&self) -> TimestampMode {
        self.timestamp_mode
    }

    /// Open the log file in `mode`, write `data` and close everything again
    fn write_file(
        &self,
        mode: Mode,
        data: &[u8],
    ) -> Result<(), embedded_sdmmc::Error<SdCardError>> {
        let volume0 = self.volume_mgr.open_volume(VolumeIdx(0))?;
        let root_dir = volume0.open_root_dir()?;
        let file = root_dir.open_file_in_dir(self.file_name, mode)?;

        if !data.is_empty() {
            file.write(data)?;
        }

        // Resources are closed on drop as well; closing explicitly surfaces errors
        file.close()?;
        root_dir.close()?;
        volume0.close()?;

        Ok(())
    }

    fn append_line(&self, line: &Line) -> Result<(), SinkError> {
        self.write_file(Mode::ReadWriteCreateOrAppend, line.as_bytes())
            .map_err(|e| {
                error!("Failed to append row to {}: {:?}", self.file_name, e);
                SinkError::Io {
                    operation: "append row",
                }
            })
    }
}

impl<S, D, T> DurableSink for SdCardSink<S, D, T>
where
    S: embedded_hal::spi::SpiDevice<u8>,
    D: embedded_hal::delay::DelayNs,
    T: TimeSource,
{
    fn clear(&mut self, reset_config: bool) -> Result<(), SinkError> {
        self.write_file(Mode::ReadWriteCreateOrTruncate, &[])
            .map_err(|e| {
                error!("Failed to truncate {}: {:?}", self.file_name, e);
                SinkError::Io {
                    operation: "truncate log file",
                }
            })?;

        self.csv.reset();
        if reset_config {
            self.timestamp_mode = TimestampMode::None;
        }
        debug!("Cleared {}", self.file_name);
        Ok(())
    }

    fn set_timestamp_mode(&mut self, mode: TimestampMode) -> Result<(), SinkError> {
        self.timestamp_mode = mode;
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
            self.append_line(&header)?;
        }
        if let Some(data) = lines.data {
            self.append_line(&data)?;
        }
        Ok(())
    }
}
