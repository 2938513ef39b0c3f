//! Model definitions for the chat-completion endpoint

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chat models the browser can switch between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChatModel {
    #[default]
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[serde(rename = "gpt-4")]
    Gpt4,
}

impl ChatModel {
    pub fn api_name(self) -> &'static str {
        match self {
            ChatModel::Gpt35Turbo => "gpt-3.5-turbo",
            ChatModel::Gpt4 => "gpt-4",
        }
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

impl FromStr for ChatModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_models()
            .iter()
            .find(|def| def.model.api_name() == s)
            .map(|def| def.model)
            .ok_or_else(|| format!("Unknown model: {s}"))
    }
}

/// Model definition with metadata
#[derive(Debug, Clone)]
pub struct ModelDef {
    pub model: ChatModel,
    /// Label shown on the model tabs (e.g., "GPT-3.5")
    pub label: &'static str,
    pub description: &'static str,
}

/// Get all available model definitions
pub fn all_models() -> &'static [ModelDef] {
    &[
        ModelDef {
            model: ChatModel::Gpt35Turbo,
            label: "GPT-3.5",
            description: "Fast and inexpensive",
        },
        ModelDef {
            model: ChatModel::Gpt4,
            label: "GPT-4",
            description: "More capable, slower",
        },
    ]
}
