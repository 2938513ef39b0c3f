//! Session state types

use serde::Serialize;

/// What an outstanding request will produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// A reply to the user's message
    Reply,
    /// The end-of-session summary
    Summary,
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingResponse { request: RequestKind },
}

impl SessionState {
    /// The assistant is "thinking": a request is in flight
    pub fn is_awaiting(&self) -> bool {
        matches!(self, SessionState::AwaitingResponse { .. })
    }
}
