//! HTTP adapters - REST API implementations.

pub mod booking;

pub use booking::{booking_router, cors_layer, BookingAppState};
