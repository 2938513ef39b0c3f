//! Session controller
//!
//! Owns the thread and the state machine. Locks are never held across the
//! completion call; the `AwaitingResponse` state keeps a second request out.

use super::transition::{transition, TransitionError};
use super::{Effect, Event, SessionState};
use crate::llm::ChatModel;
use crate::request::{ConversationContext, RequestClient, RequestError};
use crate::sanitize::ProfanityFilter;
use crate::store::{CredentialStore, Message, MessageStore};
use secrecy::SecretString;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No API key configured")]
    MissingCredential,
    #[error("Message is empty")]
    EmptyInput,
    #[error("Assistant is busy, wait for the current response")]
    Busy,
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl From<TransitionError> for SessionError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::Busy => SessionError::Busy,
            TransitionError::InvalidTransition(msg) => SessionError::InvalidTransition(msg),
        }
    }
}

/// Events pushed to connected browsers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Message { message: Message },
    StateChange { state: SessionState },
    Failure { message: String },
    Cleared,
}

/// Turns stored by one user action
#[derive(Debug, Clone, Default, Serialize)]
pub struct Exchange {
    pub user_turn: Option<Message>,
    pub reply: Option<Message>,
}

pub struct SessionController {
    store: Mutex<MessageStore>,
    state: Mutex<SessionState>,
    credentials: CredentialStore,
    client: RequestClient,
    filter: Arc<dyn ProfanityFilter>,
    events: broadcast::Sender<SessionEvent>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Held while a request is outstanding. Dropping it unsettled (the task was
/// aborted or panicked) puts the session back to `Idle`.
struct InFlight<'a> {
    controller: &'a SessionController,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let mut state = lock(&self.controller.state);
        if !state.is_awaiting() {
            return;
        }
        *state = SessionState::Idle;
        drop(state);

        tracing::warn!("Request abandoned before it finished, session reset to idle");
        self.controller.notify(SessionEvent::StateChange {
            state: SessionState::Idle,
        });
    }
}

impl SessionController {
    pub fn new(
        store: MessageStore,
        credentials: CredentialStore,
        client: RequestClient,
        filter: Arc<dyn ProfanityFilter>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            store: Mutex::new(store),
            state: Mutex::new(SessionState::Idle),
            credentials,
            client,
            filter,
            events,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn messages(&self) -> Vec<Message> {
        lock(&self.store).messages().to_vec()
    }

    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// True while a completion call is outstanding
    pub fn is_thinking(&self) -> bool {
        self.state().is_awaiting()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Submit user input and wait for the assistant's reply.
    ///
    /// Precondition failures return before anything is stored. On a failed
    /// completion the user turn stays in the thread.
    pub async fn send_message(
        &self,
        input: &str,
        model: ChatModel,
    ) -> Result<Exchange, SessionError> {
        let credential = self
            .credentials
            .get()
            .ok_or(SessionError::MissingCredential)?;
        if input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let text = self.filter.sanitize(input);
        self.drive(Event::SendMessage { text }, &credential, model)
            .await
    }

    /// Ask the model to summarize the thread. The thread is left as is.
    pub async fn send_summary(&self, model: ChatModel) -> Result<Message, SessionError> {
        let credential = self
            .credentials
            .get()
            .ok_or(SessionError::MissingCredential)?;

        let exchange = self.drive(Event::EndSession, &credential, model).await?;
        match exchange.reply {
            Some(reply) => Ok(reply),
            None => Err(SessionError::InvalidTransition(
                "summary produced no reply".to_string(),
            )),
        }
    }

    /// Start a new thread
    pub fn clear(&self) -> Result<(), SessionError> {
        let mut state = lock(&self.state);
        let result = transition(&state, Event::Clear)?;
        *state = result.new_state;

        let mut exchange = Exchange::default();
        for effect in result.effects {
            self.run_local(effect, &mut exchange);
        }
        tracing::info!("Session cleared");
        Ok(())
    }

    /// Apply `event`, then execute effects until the state machine settles
    async fn drive(
        &self,
        event: Event,
        credential: &SecretString,
        model: ChatModel,
    ) -> Result<Exchange, SessionError> {
        // History is captured before the new prompt is stored
        let (effects, context) = {
            let mut state = lock(&self.state);
            let result = transition(&state, event)?;
            *state = result.new_state;
            let context = ConversationContext::from_messages(lock(&self.store).messages());
            (result.effects, context)
        };
        let in_flight = InFlight {
            controller: self,
            settled: false,
        };

        let mut pending: VecDeque<Effect> = effects.into();
        let mut exchange = Exchange::default();
        let mut failure = None;

        while let Some(effect) = pending.pop_front() {
            let Some(prompt) = self.run_local(effect, &mut exchange) else {
                continue;
            };

            tracing::debug!(%model, history_len = context.turns().len(), "Requesting completion");
            let next = match self
                .client
                .complete(&prompt, credential, model, &context)
                .await
            {
                Ok(text) => Event::ResponseReceived { text },
                Err(e) => {
                    tracing::debug!(error = %e, "Completion failed");
                    let message = e.message.clone();
                    failure = Some(e);
                    Event::RequestFailed { message }
                }
            };
            pending.extend(self.apply(next)?);
        }
        in_flight.settle();

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(exchange),
        }
    }

    fn apply(&self, event: Event) -> Result<Vec<Effect>, SessionError> {
        let mut state = lock(&self.state);
        let result = transition(&state, event)?;
        *state = result.new_state;
        Ok(result.effects)
    }

    /// Execute an effect that needs no I/O beyond the store.
    /// Returns the prompt for `RequestCompletion`, which the caller awaits.
    fn run_local(&self, effect: Effect, exchange: &mut Exchange) -> Option<String> {
        match effect {
            Effect::AppendUserTurn { text } => {
                exchange.user_turn = Some(self.append_turn(text, false));
            }
            Effect::AppendAssistantTurn { text } => {
                exchange.reply = Some(self.append_turn(text, true));
            }
            Effect::RequestCompletion { prompt } => return Some(prompt),
            Effect::ClearThread => lock(&self.store).clear(),
            Effect::NotifyStateChange { state } => {
                self.notify(SessionEvent::StateChange { state });
            }
            Effect::NotifyFailure { message } => {
                self.notify(SessionEvent::Failure { message });
            }
            Effect::NotifyCleared => self.notify(SessionEvent::Cleared),
        }
        None
    }

    fn append_turn(&self, text: String, is_from_assistant: bool) -> Message {
        let message = {
            let mut store = lock(&self.store);
            let message = store.compose(text, is_from_assistant);
            store.append(message.clone());
            message
        };
        self.notify(SessionEvent::Message {
            message: message.clone(),
        });
        message
    }

    fn notify(&self, event: SessionEvent) {
        // No receivers is fine: no browser is listening
        let _ = self.events.send(event);
    }
}
