//! Server-Sent Events support

use crate::session::SessionEvent;
use crate::store::Message;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Snapshot sent when a browser connects
pub struct InitEvent {
    pub messages: Vec<Message>,
    pub thinking: bool,
}

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    init_event: InitEvent,
    broadcast_rx: tokio::sync::broadcast::Receiver<SessionEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move { Ok(to_axum(init_payload(init_event))) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(to_axum(event_payload(event)))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn to_axum((event_type, data): (&'static str, Value)) -> Event {
    Event::default().event(event_type).data(data.to_string())
}

fn init_payload(init: InitEvent) -> (&'static str, Value) {
    (
        "init",
        json!({
            "type": "init",
            "messages": init.messages,
            "thinking": init.thinking,
        }),
    )
}

/// SSE event name and JSON body for a session event
fn event_payload(event: SessionEvent) -> (&'static str, Value) {
    match event {
        SessionEvent::Message { message } => (
            "message",
            json!({
                "type": "message",
                "message": message
            }),
        ),
        SessionEvent::StateChange { state } => (
            "state_change",
            json!({
                "type": "state_change",
                "state": state,
                "thinking": state.is_awaiting()
            }),
        ),
        SessionEvent::Failure { message } => (
            "failure",
            json!({
                "type": "failure",
                "message": message
            }),
        ),
        SessionEvent::Cleared => (
            "cleared",
            json!({
                "type": "cleared"
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{RequestKind, SessionState};

    #[test]
    fn test_init_carries_snapshot() {
        let (name, data) = init_payload(InitEvent {
            messages: vec![Message::new("hello", false, None)],
            thinking: true,
        });

        assert_eq!(name, "init");
        assert_eq!(data["type"], "init");
        assert_eq!(data["thinking"], true);
        assert_eq!(data["messages"][0]["text"], "hello");
        assert_eq!(data["messages"][0]["isFromAssistant"], false);
    }

    #[test]
    fn test_message_event() {
        let message = Message::new("Here is a plan...", true, None);
        let (name, data) = event_payload(SessionEvent::Message {
            message: message.clone(),
        });

        assert_eq!(name, "message");
        assert_eq!(data["type"], "message");
        assert_eq!(data["message"]["id"], message.id.as_str());
        assert_eq!(data["message"]["isFromAssistant"], true);
    }

    #[test]
    fn test_state_change_reports_thinking() {
        let awaiting = SessionState::AwaitingResponse {
            request: RequestKind::Summary,
        };
        let (name, data) = event_payload(SessionEvent::StateChange { state: awaiting });
        assert_eq!(name, "state_change");
        assert_eq!(data["thinking"], true);
        assert_eq!(data["state"]["type"], "awaiting_response");
        assert_eq!(data["state"]["request"], "summary");

        let (_, data) = event_payload(SessionEvent::StateChange {
            state: SessionState::Idle,
        });
        assert_eq!(data["thinking"], false);
        assert_eq!(data["state"]["type"], "idle");
    }

    #[test]
    fn test_failure_and_cleared() {
        let (name, data) = event_payload(SessionEvent::Failure {
            message: "Rate limit exceeded".to_string(),
        });
        assert_eq!(name, "failure");
        assert_eq!(data["message"], "Rate limit exceeded");

        let (name, data) = event_payload(SessionEvent::Cleared);
        assert_eq!(name, "cleared");
        assert_eq!(data, json!({"type": "cleared"}));
    }
}
