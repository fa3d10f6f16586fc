//! Storage Adapters
//!
//! Implementations of the BookingSink port for persisting completed bookings.
//!
//! ## Available Adapters
//!
//! - **CsvBookingSink** - Appends rows to a CSV file on disk
//! - **InMemoryBookingSink** - Keeps bookings in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{CsvBookingSink, InMemoryBookingSink};
//!
//! // Production: file-based storage
//! let sink = CsvBookingSink::new("./bookings.csv");
//!
//! // Testing: in-memory storage
//! let sink = InMemoryBookingSink::new();
//! ```

mod csv_booking_sink;
mod in_memory_booking_sink;

pub use csv_booking_sink::CsvBookingSink;
pub use in_memory_booking_sink::InMemoryBookingSink;
