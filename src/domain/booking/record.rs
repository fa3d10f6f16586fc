//! Persisted booking record.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::state::BookingDetails;

/// Column headers of the tabular booking store, in order.
pub const BOOKING_COLUMNS: [&str; 4] = ["Name", "Age", "Email", "Booking Timestamp"];

/// Format of the `Booking Timestamp` column (local wall-clock).
pub const BOOKING_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One completed booking. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub name: String,
    pub age: u32,
    pub email: String,
    /// Local wall-clock time, second precision.
    pub booked_at: NaiveDateTime,
}

impl BookingRecord {
    /// Creates a record stamped with the current local time.
    pub fn new(name: impl Into<String>, age: u32, email: impl Into<String>) -> Self {
        Self::at(name, age, email, Local::now().naive_local())
    }

    /// Creates a record with an explicit timestamp, truncated to seconds.
    pub fn at(
        name: impl Into<String>,
        age: u32,
        email: impl Into<String>,
        booked_at: NaiveDateTime,
    ) -> Self {
        Self {
            name: name.into(),
            age,
            email: email.into(),
            booked_at: booked_at.with_nanosecond(0).unwrap_or(booked_at),
        }
    }

    /// Timestamp formatted as `YYYY-MM-DD HH:MM:SS`.
    pub fn timestamp_string(&self) -> String {
        self.booked_at.format(BOOKING_TIMESTAMP_FORMAT).to_string()
    }

    /// The record as a row in `BOOKING_COLUMNS` order.
    pub fn to_row(&self) -> [String; 4] {
        [
            self.name.clone(),
            self.age.to_string(),
            self.email.clone(),
            self.timestamp_string(),
        ]
    }
}

impl From<BookingDetails<'_>> for BookingRecord {
    fn from(details: BookingDetails<'_>) -> Self {
        Self::new(details.name, details.age, details.email)
    }
}
