//! CSV Booking Sink Adapter
//!
//! Stores completed bookings in a single CSV file with the fixed columns
//! `Name, Age, Email, Booking Timestamp`. Every append reads the existing
//! rows, reconciles them to those columns, adds the new row and rewrites
//! the file. Appends are serialized through one async mutex, so a sink
//! shared between sessions acts as the single writer of its file.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::booking::{BookingRecord, BOOKING_COLUMNS};
use crate::ports::{BookingSink, BookingSinkError};

type Row = [String; 4];

/// File-backed booking store.
#[derive(Debug, Clone)]
pub struct CsvBookingSink {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CsvBookingSink {
    /// Create a sink writing to `path`. The file is created on first append.
    ///
    /// # Example
    /// ```ignore
    /// let sink = CsvBookingSink::new("./data/bookings.csv");
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl BookingSink for CsvBookingSink {
    async fn append(&self, record: &BookingRecord) -> Result<(), BookingSinkError> {
        let _guard = self.write_lock.lock().await;

        let path = self.path.clone();
        let row = record.to_row();
        tokio::task::spawn_blocking(move || append_row(&path, row))
            .await
            .map_err(|e| BookingSinkError::IoError(format!("Append task failed: {}", e)))??;

        tracing::info!(path = %self.path.display(), name = %record.name, "Booking saved");
        Ok(())
    }
}

fn append_row(path: &Path, row: Row) -> Result<(), BookingSinkError> {
    let mut rows = match read_rows(path) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Could not read existing bookings; starting a new file"
            );
            Vec::new()
        }
    };
    rows.push(row);
    write_rows(path, &rows)
}

/// Reads existing rows, mapping each known column by header name.
/// Unknown columns are dropped and missing ones are left blank.
fn read_rows(path: &Path) -> Result<Vec<Row>, csv::Error> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let positions: Vec<Option<usize>> = BOOKING_COLUMNS
        .iter()
        .map(|column| headers.iter().position(|h| h.trim() == *column))
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row = Row::default();
        for (slot, position) in row.iter_mut().zip(&positions) {
            if let Some(field) = position.and_then(|i| record.get(i)) {
                *slot = field.to_string();
            }
        }
        rows.push(row);
    }

    Ok(rows)
}

fn write_rows(path: &Path, rows: &[Row]) -> Result<(), BookingSinkError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;

    writer
        .write_record(BOOKING_COLUMNS)
        .map_err(|e| csv_error(path, e))?;
    for row in rows {
        writer.write_record(row).map_err(|e| csv_error(path, e))?;
    }

    writer.flush().map_err(|e| io_error(path, e))
}

fn csv_error(path: &Path, err: csv::Error) -> BookingSinkError {
    match err.into_kind() {
        csv::ErrorKind::Io(e) => io_error(path, e),
        other => BookingSinkError::Encoding(format!("{:?}", other)),
    }
}

fn io_error(path: &Path, err: io::Error) -> BookingSinkError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => BookingSinkError::PermissionDenied {
            path: path.display().to_string(),
        },
        _ => BookingSinkError::IoError(err.to_string()),
    }
}
