//! Startup configuration from the environment

use crate::llm::{ChatModel, DEFAULT_BASE_URL};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub default_model: ChatModel,
    /// Base URL of the chat-completion API, without the `/v1/...` path
    pub base_url: String,
    /// Extra words for the profanity filter
    pub blocked_words: Vec<String>,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup("SOLACE_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".solace").join("solace.db")
            },
            PathBuf::from,
        );

        let port = lookup("SOLACE_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let default_model = match lookup("SOLACE_DEFAULT_MODEL") {
            Some(id) => id.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "Ignoring SOLACE_DEFAULT_MODEL");
                ChatModel::default()
            }),
            None => ChatModel::default(),
        };

        let base_url = lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let blocked_words = lookup("SOLACE_BLOCKED_WORDS")
            .map(|words| {
                words
                    .split(',')
                    .map(str::trim)
                    .filter(|w| !w.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            db_path,
            port,
            default_model,
            base_url,
            blocked_words,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}
