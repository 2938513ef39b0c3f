//! Conversation turn record

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One turn in the conversation, as persisted and as sent to the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub text: String,
    /// Older history stored this flag as `ai`
    #[serde(alias = "ai")]
    pub is_from_assistant: bool,
}

impl Message {
    /// Create a turn stamped strictly after `previous`
    pub fn new(
        text: impl Into<String>,
        is_from_assistant: bool,
        previous: Option<&Message>,
    ) -> Self {
        let now = now_millis();
        let created_at = match previous {
            Some(prev) if prev.created_at >= now => prev.created_at + TimeDelta::milliseconds(1),
            _ => now,
        };

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at,
            text: text.into(),
            is_from_assistant,
        }
    }
}

/// Current time truncated to the persisted precision
fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}
