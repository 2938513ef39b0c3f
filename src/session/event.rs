//! Events that can occur in a session

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    /// Submit already-sanitized text
    SendMessage { text: String },
    /// Ask for the end-of-session summary
    EndSession,
    /// Start a new thread
    Clear,

    // Completion events
    ResponseReceived { text: String },
    RequestFailed { message: String },
}
