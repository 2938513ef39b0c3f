//! LLM provider abstraction
//!
//! Provides a common interface for the hosted chat-completion endpoint.

mod error;
mod models;
mod openai;
mod types;

pub use error::LlmError;
#[allow(unused_imports)] // Used in tests
pub use error::LlmErrorKind;
pub use models::{all_models, ChatModel};
pub use openai::{OpenAIService, DEFAULT_BASE_URL};
pub use types::*;

use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::Arc;

/// Common interface for LLM providers
///
/// The credential travels with each call: it belongs to the browser session,
/// not to the service.
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(
        &self,
        credential: &SecretString,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError>;
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(
        &self,
        credential: &SecretString,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(credential, request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %request.model,
                    duration_ms = %duration.as_millis(),
                    history_len = request.messages.len(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %request.model,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    "LLM request failed"
                );
            }
        }

        result
    }
}
