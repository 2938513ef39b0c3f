//! Effects produced by state transitions

use super::SessionState;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Store a user-authored turn
    AppendUserTurn { text: String },

    /// Store an assistant-authored turn
    AppendAssistantTurn { text: String },

    /// Issue one completion call with the given prompt
    RequestCompletion { prompt: String },

    /// Empty the stored thread
    ClearThread,

    /// Tell connected browsers about the new state
    NotifyStateChange { state: SessionState },

    /// Tell connected browsers the request failed
    NotifyFailure { message: String },

    /// Tell connected browsers the thread was emptied
    NotifyCleared,
}

impl Effect {
    pub fn notify_state(state: SessionState) -> Self {
        Effect::NotifyStateChange { state }
    }
}
