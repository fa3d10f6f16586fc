//! A single chat session: conversation state plus its transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::conversation::{ConversationEngine, TurnOutcome, GREETING};
use crate::domain::booking::{BookingStage, ConversationState};
use crate::domain::foundation::SessionId;

/// One user utterance and the reply it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: String,
    pub bot: String,
}

/// Isolated conversation owned by one client.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    state: ConversationState,
    transcript: Vec<Exchange>,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: ConversationState::new(),
            transcript: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn stage(&self) -> BookingStage {
        self.state.stage
    }

    pub fn transcript(&self) -> &[Exchange] {
        &self.transcript
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time of the last turn or reset; creation time before either.
    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    /// Opening bot message shown before the first user turn.
    pub fn greeting(&self) -> &'static str {
        GREETING
    }

    /// Runs one turn and records it in the transcript.
    pub async fn handle_message(
        &mut self,
        engine: &ConversationEngine,
        utterance: &str,
    ) -> TurnOutcome {
        let outcome = engine.handle_turn(self.state.clone(), utterance).await;

        self.state = outcome.state.clone();
        self.last_active = Utc::now();
        self.transcript.push(Exchange {
            user: utterance.to_string(),
            bot: outcome.reply.clone(),
        });

        tracing::debug!(
            session_id = %self.id,
            stage = %self.state.stage,
            turn = self.transcript.len(),
            "Turn completed"
        );
        outcome
    }

    /// Clears state and transcript; no external call.
    pub fn reset(&mut self) {
        self.state.reset();
        self.transcript.clear();
        self.last_active = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
