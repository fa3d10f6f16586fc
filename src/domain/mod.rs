//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, errors, state machine trait)
//! - `booking` - Booking stages, conversation state, validators and the
//!   decision contract with the generation service

pub mod booking;
pub mod foundation;
