//! Persisted browser state: the message thread and the API key
//!
//! Every mutation writes the full thread back under one key; reads tolerate
//! a missing or corrupt entry by starting over with an empty thread.

mod kv;
mod message;

pub use kv::{KvError, KvStore, SqliteKv};
#[allow(unused_imports)] // Used in tests
pub use kv::MemoryKv;
pub use message::Message;

use secrecy::SecretString;
use std::sync::Arc;
use thiserror::Error;

/// Key holding the JSON-encoded thread
pub const MESSAGES_KEY: &str = "messages";
/// Key holding the API key
pub const CREDENTIAL_KEY: &str = "api-key";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Kv(#[from] KvError),
    #[error("Malformed history: {0}")]
    MalformedHistory(#[from] serde_json::Error),
    #[error("API key must not be empty")]
    EmptyCredential,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Ordered, append-only list of conversation turns
pub struct MessageStore {
    kv: Arc<dyn KvStore>,
    messages: Vec<Message>,
}

impl MessageStore {
    /// Restore the persisted thread, or start empty
    pub fn load(kv: Arc<dyn KvStore>) -> Self {
        let messages = match read_history(kv.as_ref()) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable message history");
                Vec::new()
            }
        };

        tracing::debug!(count = messages.len(), "Message history loaded");
        Self { kv, messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Build a turn that sorts after everything stored so far
    pub fn compose(&self, text: impl Into<String>, is_from_assistant: bool) -> Message {
        Message::new(text, is_from_assistant, self.messages.last())
    }

    /// Add a turn to the end of the thread and persist the whole thread
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.persist();
    }

    /// Empty the thread and persist the empty state
    pub fn clear(&mut self) {
        self.messages.clear();
        self.persist();
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.messages)
            .map_err(StoreError::from)
            .and_then(|json| self.kv.set(MESSAGES_KEY, &json).map_err(StoreError::from));

        if let Err(e) = result {
            tracing::error!(error = %e, count = self.messages.len(), "Failed to persist messages");
        }
    }
}

fn read_history(kv: &dyn KvStore) -> StoreResult<Vec<Message>> {
    match kv.get(MESSAGES_KEY)? {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(Vec::new()),
    }
}

/// The API key entry
#[derive(Clone)]
pub struct CredentialStore {
    kv: Arc<dyn KvStore>,
}

impl CredentialStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// The stored key, if any; empty counts as absent
    pub fn get(&self) -> Option<SecretString> {
        match self.kv.get(CREDENTIAL_KEY) {
            Ok(Some(key)) if !key.trim().is_empty() => Some(SecretString::from(key)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read API key");
                None
            }
        }
    }

    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }

    pub fn set(&self, key: &str) -> StoreResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(StoreError::EmptyCredential);
        }
        self.kv.set(CREDENTIAL_KEY, key)?;
        tracing::info!("API key updated");
        Ok(())
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.kv.remove(CREDENTIAL_KEY)?;
        tracing::info!("API key removed");
        Ok(())
    }
}
