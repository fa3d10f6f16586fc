//! In-Memory Booking Sink Adapter
//!
//! Keeps appended bookings in memory. Useful for testing and development.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::booking::BookingRecord;
use crate::ports::{BookingSink, BookingSinkError};

/// In-memory booking store
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingSink {
    records: Arc<RwLock<Vec<BookingRecord>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryBookingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink whose appends always fail with an IO error
    pub fn failing() -> Self {
        let sink = Self::new();
        sink.fail_writes.store(true, Ordering::SeqCst);
        sink
    }

    /// Snapshot of stored bookings, oldest first
    pub async fn records(&self) -> Vec<BookingRecord> {
        self.records.read().await.clone()
    }

    /// Number of stored bookings
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether nothing has been stored
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl BookingSink for InMemoryBookingSink {
    async fn append(&self, record: &BookingRecord) -> Result<(), BookingSinkError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BookingSinkError::IoError("simulated write failure".to_string()));
        }
        self.records.write().await.push(record.clone());
        Ok(())
    }
}
