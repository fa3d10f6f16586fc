//! Booking Sink Port - Interface for durable booking storage.
//!
//! The store is append-only from this system's point of view: records
//! are written once and never read back by the conversation layer.

use async_trait::async_trait;

use crate::domain::booking::BookingRecord;

/// Errors that can occur while appending a booking.
#[derive(Debug, thiserror::Error)]
pub enum BookingSinkError {
    #[error("Permission denied writing bookings to {path}")]
    PermissionDenied { path: String },

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Failed to encode booking row: {0}")]
    Encoding(String),
}

/// Port for persisting completed bookings.
///
/// Implementations shared between sessions must serialize appends.
#[async_trait]
pub trait BookingSink: Send + Sync {
    /// Append one booking to the store.
    ///
    /// # Errors
    /// Returns `BookingSinkError` if the write fails. Callers log the
    /// failure; it never fails a conversation turn.
    async fn append(&self, record: &BookingRecord) -> Result<(), BookingSinkError>;
}
