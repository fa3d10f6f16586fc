//! Booking Agent - Conversational hotel booking service
//!
//! Collects a guest's name, age and email over a turn-based chat. A text
//! generation service phrases the replies and proposes the next step,
//! while local code enforces the booking rules and persists confirmed
//! bookings.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
