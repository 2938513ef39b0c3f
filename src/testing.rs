//! Mock implementations for testing
//!
//! These mocks enable controller and API tests without network I/O.

use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub credential: String,
    pub request: LlmRequest,
}

/// Mock LLM service that returns queued responses
///
/// A gated mock holds every call until [`MockLlmService::release`] is
/// notified, so tests can observe the in-flight state.
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl MockLlmService {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some((Arc::new(Notify::new()), Arc::new(Notify::new()))),
            ..Self::new()
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Notified once per call when a gated call starts
    pub fn started(&self) -> Arc<Notify> {
        self.gate.as_ref().map(|(s, _)| s.clone()).unwrap()
    }

    /// Notify once to let one gated call finish
    pub fn release(&self) -> Arc<Notify> {
        self.gate.as_ref().map(|(_, r)| r.clone()).unwrap()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(
        &self,
        credential: &SecretString,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            credential: credential.expose_secret().to_string(),
            request: request.clone(),
        });

        if let Some((started, release)) = &self.gate {
            started.notify_one();
            release.notified().await;
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }
}
