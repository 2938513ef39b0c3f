//! Conversation session: state machine and the controller that drives it
//!
//! Transitions are pure; the controller executes the effects they produce
//! against the message store and the request client.

mod controller;
mod effect;
mod event;
mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use controller::{Exchange, SessionController, SessionError, SessionEvent};
pub use effect::Effect;
pub use event::Event;
pub use state::{RequestKind, SessionState};
