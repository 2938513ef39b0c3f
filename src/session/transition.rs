//! Pure state transition function
//!
//! Given the same state and event it always produces the same result, with
//! no I/O. `AwaitingResponse` is the mutual-exclusion gate: new user actions
//! are rejected until the outstanding request resolves.

use super::{Effect, Event, RequestKind, SessionState};
use crate::persona::SUMMARY_PROMPT;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Assistant is busy, wait for the current response")]
    Busy,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub fn transition(state: &SessionState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Idle + SendMessage -> AwaitingResponse (reply)
        (SessionState::Idle, Event::SendMessage { text }) => {
            let next = SessionState::AwaitingResponse {
                request: RequestKind::Reply,
            };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::AppendUserTurn { text: text.clone() })
                .with_effect(Effect::notify_state(next))
                .with_effect(Effect::RequestCompletion { prompt: text }))
        }

        // Idle + EndSession -> AwaitingResponse (summary); the prompt is not stored
        (SessionState::Idle, Event::EndSession) => {
            let next = SessionState::AwaitingResponse {
                request: RequestKind::Summary,
            };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::notify_state(next))
                .with_effect(Effect::RequestCompletion {
                    prompt: SUMMARY_PROMPT.to_string(),
                }))
        }

        (SessionState::Idle, Event::Clear) => Ok(TransitionResult::new(SessionState::Idle)
            .with_effect(Effect::ClearThread)
            .with_effect(Effect::NotifyCleared)),

        // Busy + any user action -> reject
        (
            SessionState::AwaitingResponse { .. },
            Event::SendMessage { .. } | Event::EndSession | Event::Clear,
        ) => Err(TransitionError::Busy),

        (SessionState::AwaitingResponse { .. }, Event::ResponseReceived { text }) => {
            Ok(TransitionResult::new(SessionState::Idle)
                .with_effect(Effect::AppendAssistantTurn { text })
                .with_effect(Effect::notify_state(SessionState::Idle)))
        }

        (SessionState::AwaitingResponse { .. }, Event::RequestFailed { message }) => {
            Ok(TransitionResult::new(SessionState::Idle)
                .with_effect(Effect::NotifyFailure { message })
                .with_effect(Effect::notify_state(SessionState::Idle)))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {event:?}"
        ))),
    }
}
