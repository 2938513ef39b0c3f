//! Property-based tests for the session state machine
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::transition::*;
use super::*;
use proptest::prelude::*;

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z ]{1,30}".prop_map(|text| Event::SendMessage { text }),
        Just(Event::EndSession),
        Just(Event::Clear),
        "[a-zA-Z ]{1,30}".prop_map(|text| Event::ResponseReceived { text }),
        "[a-zA-Z ]{1,30}".prop_map(|message| Event::RequestFailed { message }),
    ]
}

fn is_user_action(event: &Event) -> bool {
    matches!(
        event,
        Event::SendMessage { .. } | Event::EndSession | Event::Clear
    )
}

/// Thread contents as the controller would maintain them
#[derive(Default)]
struct Replay {
    turns: Vec<(bool, String)>,
    outstanding: u32,
}

impl Replay {
    fn apply(&mut self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::AppendUserTurn { text } => self.turns.push((false, text.clone())),
                Effect::AppendAssistantTurn { text } => self.turns.push((true, text.clone())),
                Effect::RequestCompletion { .. } => self.outstanding += 1,
                Effect::ClearThread => self.turns.clear(),
                Effect::NotifyStateChange { .. }
                | Effect::NotifyFailure { .. }
                | Effect::NotifyCleared => {}
            }
        }
    }
}

proptest! {
    #[test]
    fn prop_rejected_events_change_nothing(events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut state = SessionState::Idle;
        for event in events {
            let before = state;
            match transition(&state, event) {
                Ok(result) => state = result.new_state,
                Err(_) => prop_assert_eq!(state, before),
            }
        }
    }

    #[test]
    fn prop_at_most_one_request_in_flight(events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut state = SessionState::Idle;
        let mut replay = Replay::default();
        for event in events {
            if let Ok(result) = transition(&state, event.clone()) {
                replay.apply(&result.effects);
                if matches!(event, Event::ResponseReceived { .. } | Event::RequestFailed { .. }) {
                    replay.outstanding -= 1;
                }
                state = result.new_state;
            }
            prop_assert!(replay.outstanding <= 1);
            prop_assert_eq!(replay.outstanding == 1, state.is_awaiting());
        }
    }

    #[test]
    fn prop_user_actions_rejected_while_awaiting(
        prefix in proptest::collection::vec(arb_event(), 0..20),
        action in arb_event().prop_filter("user action", is_user_action),
    ) {
        let mut state = SessionState::Idle;
        for event in prefix {
            if let Ok(result) = transition(&state, event) {
                state = result.new_state;
            }
        }
        let outcome = transition(&state, action);
        if state.is_awaiting() {
            prop_assert!(matches!(outcome, Err(TransitionError::Busy)));
        } else {
            prop_assert!(outcome.is_ok());
        }
    }

    #[test]
    fn prop_turns_match_accepted_events(events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut state = SessionState::Idle;
        let mut replay = Replay::default();
        let (mut sent, mut answered) = (0usize, 0usize);
        for event in events {
            if let Ok(result) = transition(&state, event.clone()) {
                match event {
                    Event::SendMessage { .. } => sent += 1,
                    Event::ResponseReceived { .. } => answered += 1,
                    Event::Clear => (sent, answered) = (0, 0),
                    Event::EndSession | Event::RequestFailed { .. } => {}
                }
                replay.apply(&result.effects);
                state = result.new_state;
            }
        }
        let users = replay.turns.iter().filter(|(from_assistant, _)| !from_assistant).count();
        prop_assert_eq!(users, sent);
        prop_assert_eq!(replay.turns.len() - users, answered);
    }
}
