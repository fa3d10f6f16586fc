//! Booking storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where completed bookings are written
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// CSV file holding one row per booking
    #[serde(default = "default_bookings_path")]
    pub bookings_path: PathBuf,
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bookings_path.as_os_str().is_empty() {
            return Err(ValidationError::EmptyBookingsPath);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bookings_path: default_bookings_path(),
        }
    }
}

fn default_bookings_path() -> PathBuf {
    PathBuf::from("bookings.csv")
}
