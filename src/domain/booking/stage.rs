//! Booking conversation stages.
//!
//! The six-value closed set of stages a booking conversation moves through.
//! Anything the generation service emits outside this set is never a stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// The discrete phase of a booking conversation.
///
/// - `AskName` → `AskAge` → `AskEmail` → `ConfirmBooking` is the happy path
/// - `AskAge` → `RejectBooking` when the guest is under the minimum age
/// - `ConfirmBooking`, `RejectBooking` and `EndConversation` are absorbing
///   until the guest asks to start over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStage {
    #[default]
    AskName,
    AskAge,
    AskEmail,
    ConfirmBooking,
    RejectBooking,
    EndConversation,
}

impl BookingStage {
    /// Every legal stage, in declaration order.
    pub const ALL: [BookingStage; 6] = [
        BookingStage::AskName,
        BookingStage::AskAge,
        BookingStage::AskEmail,
        BookingStage::ConfirmBooking,
        BookingStage::RejectBooking,
        BookingStage::EndConversation,
    ];

    /// Wire name of the stage, as exchanged with the generation service.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStage::AskName => "ASK_NAME",
            BookingStage::AskAge => "ASK_AGE",
            BookingStage::AskEmail => "ASK_EMAIL",
            BookingStage::ConfirmBooking => "CONFIRM_BOOKING",
            BookingStage::RejectBooking => "REJECT_BOOKING",
            BookingStage::EndConversation => "END_CONVERSATION",
        }
    }

    /// Returns true once the conversation reached an outcome.
    pub fn is_absorbing(&self) -> bool {
        matches!(
            self,
            Self::ConfirmBooking | Self::RejectBooking | Self::EndConversation
        )
    }
}

impl fmt::Display for BookingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStage {
    type Err = ValidationError;

    /// Case-insensitive, whitespace-tolerant parse of a wire name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                ValidationError::invalid_format("next_action", format!("unknown stage '{}'", wanted))
            })
    }
}

impl StateMachine for BookingStage {
    fn can_transition_to(&self, target: &Self) -> bool {
        use BookingStage::*;
        matches!(
            (self, target),
            // Error budget exhaustion restarts from any stage
            (_, AskName) |
            (AskName, AskAge) |
            (AskAge, AskEmail) |
            (AskAge, RejectBooking) |
            (AskEmail, ConfirmBooking) |
            (ConfirmBooking, EndConversation) |
            (RejectBooking, EndConversation) |
            (EndConversation, EndConversation)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use BookingStage::*;
        match self {
            AskName => vec![AskName, AskAge],
            AskAge => vec![AskName, AskEmail, RejectBooking],
            AskEmail => vec![AskName, ConfirmBooking],
            ConfirmBooking | RejectBooking => vec![AskName, EndConversation],
            EndConversation => vec![AskName, EndConversation],
        }
    }
}
