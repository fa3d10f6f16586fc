//! Running state of one booking conversation.

use serde::{Deserialize, Serialize};

use super::decision::ExtractedFields;
use super::stage::BookingStage;

/// What happened after a failed turn was counted against the error budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorBudget {
    /// Budget left; stay on the current stage and reprompt.
    Remaining,
    /// Ceiling reached; the state was reset to its initial value.
    Exhausted,
}

/// Fields needed to persist a booking, borrowed from a complete state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingDetails<'a> {
    pub name: &'a str,
    pub age: u32,
    pub email: &'a str,
}

/// Mutable, single-owner state of a booking conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversationState {
    /// Current stage of the conversation.
    pub stage: BookingStage,
    /// Guest name, once accepted.
    pub name: Option<String>,
    /// Guest age, once accepted.
    pub age: Option<u32>,
    /// Guest email, once accepted.
    pub email: Option<String>,
    /// Consecutive failures to progress within the current stage.
    pub error_count: u32,
}

impl ConversationState {
    /// Creates the initial state: asking for a name, nothing collected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hard reset to the initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Counts one failure to progress, resetting the whole state once
    /// `max_errors` consecutive failures accumulated.
    pub fn record_failure(&mut self, max_errors: u32) -> ErrorBudget {
        self.error_count += 1;
        if self.error_count >= max_errors {
            self.reset();
            ErrorBudget::Exhausted
        } else {
            ErrorBudget::Remaining
        }
    }

    /// Adopts a stage from a successful decision and clears the error count.
    pub fn advance_to(&mut self, stage: BookingStage) {
        self.stage = stage;
        self.error_count = 0;
    }

    /// Last-write-wins merge: present fields overwrite, absent fields are kept.
    pub fn merge(&mut self, fields: &ExtractedFields) {
        if let Some(name) = &fields.name {
            self.name = Some(name.clone());
        }
        if let Some(age) = fields.age {
            self.age = Some(age);
        }
        if let Some(email) = &fields.email {
            self.email = Some(email.clone());
        }
    }

    /// Returns the booking fields if name, age and email are all present.
    pub fn booking_details(&self) -> Option<BookingDetails<'_>> {
        Some(BookingDetails {
            name: self.name.as_deref()?,
            age: self.age?,
            email: self.email.as_deref()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_state() -> ConversationState {
        ConversationState {
            stage: BookingStage::AskEmail,
            name: Some("Alex".to_string()),
            age: Some(25),
            email: Some("alex@example.com".to_string()),
            error_count: 1,
        }
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn initial_state_asks_for_name() {
            let state = ConversationState::new();
            assert_eq!(state.stage, BookingStage::AskName);
            assert!(state.name.is_none());
            assert!(state.age.is_none());
            assert!(state.email.is_none());
            assert_eq!(state.error_count, 0);
        }

        #[test]
        fn reset_clears_everything() {
            let mut state = filled_state();
            state.reset();
            assert_eq!(state, ConversationState::new());
        }

        #[test]
        fn advance_clears_error_count() {
            let mut state = filled_state();
            state.advance_to(BookingStage::ConfirmBooking);
            assert_eq!(state.stage, BookingStage::ConfirmBooking);
            assert_eq!(state.error_count, 0);
        }
    }

    mod error_budget {
        use super::*;

        #[test]
        fn first_failure_keeps_state() {
            let mut state = ConversationState::new();
            state.stage = BookingStage::AskAge;
            state.name = Some("Alex".to_string());

            assert_eq!(state.record_failure(2), ErrorBudget::Remaining);
            assert_eq!(state.error_count, 1);
            assert_eq!(state.stage, BookingStage::AskAge);
            assert_eq!(state.name.as_deref(), Some("Alex"));
        }

        #[test]
        fn reaching_ceiling_resets() {
            let mut state = filled_state();
            assert_eq!(state.record_failure(2), ErrorBudget::Exhausted);
            assert_eq!(state, ConversationState::new());
        }
    }

    mod merge {
        use super::*;

        #[test]
        fn absent_fields_are_left_untouched() {
            let mut state = filled_state();
            state.merge(&ExtractedFields {
                name: Some("Sam".to_string()),
                age: None,
                email: None,
            });

            assert_eq!(state.name.as_deref(), Some("Sam"));
            assert_eq!(state.age, Some(25));
            assert_eq!(state.email.as_deref(), Some("alex@example.com"));
        }

        #[test]
        fn present_fields_overwrite() {
            let mut state = filled_state();
            state.merge(&ExtractedFields {
                name: None,
                age: Some(40),
                email: Some("sam@example.org".to_string()),
            });

            assert_eq!(state.age, Some(40));
            assert_eq!(state.email.as_deref(), Some("sam@example.org"));
        }
    }

    mod booking_details {
        use super::*;

        #[test]
        fn complete_state_yields_details() {
            let state = filled_state();
            let details = state.booking_details().unwrap();
            assert_eq!(details.name, "Alex");
            assert_eq!(details.age, 25);
            assert_eq!(details.email, "alex@example.com");
        }

        #[test]
        fn any_missing_field_yields_none() {
            let mut state = filled_state();
            state.age = None;
            assert!(state.booking_details().is_none());

            let mut state = filled_state();
            state.email = None;
            assert!(state.booking_details().is_none());
        }
    }
}
