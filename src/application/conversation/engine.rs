//! ConversationEngine - Runs one turn of the booking dialogue.
//!
//! The engine is a function of `(state, utterance)` to `(state, reply)`.
//! Local validation decides first; the text provider is only consulted
//! once the input is acceptable, and its decision is applied through the
//! typed `ConversationDecision`, never as raw text.

use std::sync::Arc;

use crate::domain::booking::{
    is_nontrivial_name, validate_age, validate_email, BookingRecord, BookingStage,
    ConversationDecision, ConversationState, DecisionExtractor, ErrorBudget, NextAction,
};
use crate::domain::foundation::StateMachine;
use crate::ports::BookingSink;

use super::generation::GenerationClient;
use super::prompts::{self, Instruction};

pub const GREETING: &str = "Hello! I'm the Hotel Booking Bot. To start, please tell me your name.";
pub const RESTART_MESSAGE: &str = "Okay, let's start over! What is your name?";
pub const CLARIFICATION_SUFFIX: &str = "\nUnsure on the next step. Could you clarify?";

const NAME_REPROMPT: &str = "I need a valid name to proceed. Please tell me your name.";
const NAME_RESET: &str = "Having trouble getting your name. Let's restart.";
const AGE_REPROMPT: &str = "Invalid age. Please enter a number (e.g., 25).";
const AGE_RESET: &str = "Trouble with age input. Let's restart. Name?";
const EMAIL_REPROMPT: &str =
    "Invalid email format. Please enter a valid email (e.g., name@example.com).";
const EMAIL_RESET: &str = "Trouble with email. Let's restart. Name?";
const SERVICE_FAILURE: &str = "Sorry, encountered an issue. Try again?";
const SERVICE_FAILURE_RESET: &str = "Processing error. Let's restart. Name?";

const RESTART_PHRASES: [&str; 3] = ["start again", "restart", "new booking"];

/// Business limits applied by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Youngest age allowed to book.
    pub min_age: u32,
    /// Consecutive failures tolerated before a hard reset.
    pub max_errors: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_age: 18,
            max_errors: 2,
        }
    }
}

/// Result of one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// State after the turn (possibly reset).
    pub state: ConversationState,
    /// Message shown to the user.
    pub reply: String,
    /// Number of generation requests made during the turn.
    pub generation_calls: u32,
    /// Booking accepted by the sink during this turn, if any.
    pub booking: Option<BookingRecord>,
}

impl TurnOutcome {
    fn local(state: ConversationState, reply: impl Into<String>) -> Self {
        Self {
            state,
            reply: reply.into(),
            generation_calls: 0,
            booking: None,
        }
    }
}

/// True if the utterance asks to begin a new booking.
pub fn is_restart_request(utterance: &str) -> bool {
    let lowered = utterance.to_lowercase();
    RESTART_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

/// Drives the booking dialogue one utterance at a time.
#[derive(Clone)]
pub struct ConversationEngine {
    generation: GenerationClient,
    extractor: DecisionExtractor,
    sink: Arc<dyn BookingSink>,
    config: EngineConfig,
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("generation", &self.generation)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ConversationEngine {
    pub fn new(generation: GenerationClient, sink: Arc<dyn BookingSink>) -> Self {
        Self {
            generation,
            extractor: DecisionExtractor::new(),
            sink,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Processes one user utterance against `state`.
    pub async fn handle_turn(&self, mut state: ConversationState, utterance: &str) -> TurnOutcome {
        let instruction = match state.stage {
            BookingStage::AskName => {
                let name = utterance.trim();
                if !is_nontrivial_name(name) {
                    tracing::warn!(stage = %state.stage, "Rejected name input");
                    return self.local_failure(state, NAME_REPROMPT, NAME_RESET);
                }
                state.name = Some(name.to_string());
                prompts::acknowledge_name(name)
            }
            BookingStage::AskAge => match validate_age(utterance) {
                Ok(age) => {
                    state.age = Some(age);
                    if age >= self.config.min_age {
                        prompts::request_email(state.name.as_deref(), age, self.config.min_age)
                    } else {
                        prompts::reject_underage(state.name.as_deref(), age, self.config.min_age)
                    }
                }
                Err(e) => {
                    tracing::warn!(stage = %state.stage, error = %e, "Rejected age input");
                    return self.local_failure(state, AGE_REPROMPT, AGE_RESET);
                }
            },
            BookingStage::AskEmail => {
                let email = utterance.trim();
                if !validate_email(email) {
                    tracing::warn!(stage = %state.stage, "Rejected email input");
                    return self.local_failure(state, EMAIL_REPROMPT, EMAIL_RESET);
                }
                state.email = Some(email.to_string());
                prompts::confirm_booking(state.name.as_deref(), state.age, email)
            }
            // The remaining stages are absorbing.
            _ => {
                if is_restart_request(utterance) {
                    tracing::info!(from = %state.stage, "Restart requested");
                    return TurnOutcome::local(ConversationState::new(), RESTART_MESSAGE);
                }
                prompts::follow_up(utterance, state.stage)
            }
        };

        self.delegate(state, instruction).await
    }

    /// Counts a failed turn and picks the reprompt or the reset message.
    fn local_failure(
        &self,
        mut state: ConversationState,
        reprompt: &str,
        reset: &str,
    ) -> TurnOutcome {
        let reply = match state.record_failure(self.config.max_errors) {
            ErrorBudget::Remaining => reprompt,
            ErrorBudget::Exhausted => {
                tracing::info!("Error budget exhausted; conversation reset");
                reset
            }
        };
        TurnOutcome::local(state, reply)
    }

    async fn delegate(&self, state: ConversationState, instruction: Instruction) -> TurnOutcome {
        tracing::debug!(stage = %state.stage, target = %instruction.target, "Requesting decision");

        let decision = self
            .generation
            .generate(&instruction.text)
            .await
            .and_then(|raw| self.extractor.extract(&raw));

        let mut outcome = match decision {
            Some(decision) => self.apply(state, decision).await,
            None => self.local_failure(state, SERVICE_FAILURE, SERVICE_FAILURE_RESET),
        };
        outcome.generation_calls = 1;
        outcome
    }

    async fn apply(&self, mut state: ConversationState, decision: ConversationDecision) -> TurnOutcome {
        // A new guest starts from nothing collected.
        if decision.next_action == NextAction::Stage(BookingStage::AskName)
            && state.stage.is_absorbing()
        {
            tracing::info!(from = %state.stage, "Restart adopted from decision");
            state.reset();
        }

        if let Some(fields) = &decision.extracted_data {
            state.merge(fields);
        }

        match decision.next_action {
            NextAction::Stage(next) => {
                let previous = state.stage;
                if !previous.can_transition_to(&next) {
                    tracing::warn!(from = %previous, to = %next, "Off-flow stage adopted from decision");
                }
                state.advance_to(next);

                let booking = if next == BookingStage::ConfirmBooking
                    && previous != BookingStage::ConfirmBooking
                {
                    self.persist(&state).await
                } else {
                    None
                };

                TurnOutcome {
                    state,
                    reply: decision.bot_message,
                    generation_calls: 0,
                    booking,
                }
            }
            NextAction::Unrecognized(raw) => {
                tracing::warn!(stage = %state.stage, next_action = %raw, "Unexpected next_action");
                TurnOutcome::local(state, decision.bot_message + CLARIFICATION_SUFFIX)
            }
        }
    }

    /// Saves the booking if every field is present. Failures are logged only.
    async fn persist(&self, state: &ConversationState) -> Option<BookingRecord> {
        let Some(details) = state.booking_details() else {
            tracing::warn!(
                has_name = state.name.is_some(),
                has_age = state.age.is_some(),
                has_email = state.email.is_some(),
                "Booking not saved: details missing from state"
            );
            return None;
        };

        let record = BookingRecord::from(details);
        match self.sink.append(&record).await {
            Ok(()) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save booking");
                None
            }
        }
    }
}
