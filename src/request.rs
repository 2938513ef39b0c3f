//! One round trip to the completion endpoint, primed with the counselor
//! persona and the prior turns of the current thread.

use crate::llm::{ChatModel, LlmError, LlmMessage, LlmRequest, LlmService};
use crate::persona::{COUNSELOR_PERSONA, TEMPERATURE};
use crate::store::Message;
use secrecy::SecretString;
use std::sync::Arc;
use thiserror::Error;

/// Any failure of the completion call. Provider error kinds are not
/// distinguished past this point.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RequestError {
    pub message: String,
}

impl From<LlmError> for RequestError {
    fn from(e: LlmError) -> Self {
        Self { message: e.message }
    }
}

/// History fed to the model for one request
///
/// Built from the stored thread when the request starts, so it always matches
/// what the user sees and is empty after the thread is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationContext {
    turns: Vec<LlmMessage>,
}

impl ConversationContext {
    pub fn from_messages(messages: &[Message]) -> Self {
        Self {
            turns: messages
                .iter()
                .map(|m| {
                    if m.is_from_assistant {
                        LlmMessage::assistant(m.text.clone())
                    } else {
                        LlmMessage::user(m.text.clone())
                    }
                })
                .collect(),
        }
    }

    pub fn turns(&self) -> &[LlmMessage] {
        &self.turns
    }
}

/// Issues completion calls with a fixed persona
#[derive(Clone)]
pub struct RequestClient {
    service: Arc<dyn LlmService>,
}

impl RequestClient {
    pub fn new(service: Arc<dyn LlmService>) -> Self {
        Self { service }
    }

    /// Assemble persona, history, and the new prompt
    pub fn build_request(
        prompt: &str,
        model: ChatModel,
        context: &ConversationContext,
    ) -> LlmRequest {
        let mut messages = Vec::with_capacity(context.turns().len() + 1);
        messages.extend_from_slice(context.turns());
        messages.push(LlmMessage::user(prompt));

        LlmRequest {
            model,
            system: COUNSELOR_PERSONA.to_string(),
            messages,
            temperature: Some(TEMPERATURE),
        }
    }

    /// Send `prompt` and return the reply text as the model wrote it.
    /// Single attempt. A blank reply counts as a failure.
    pub async fn complete(
        &self,
        prompt: &str,
        credential: &SecretString,
        model: ChatModel,
        context: &ConversationContext,
    ) -> Result<String, RequestError> {
        let request = Self::build_request(prompt, model, context);
        let response = self.service.complete(credential, &request).await?;

        if response.text.trim().is_empty() {
            return Err(RequestError {
                message: "The model returned an empty reply".to_string(),
            });
        }
        Ok(response.text)
    }
}
