//! Profanity replacement applied to user input before it is stored or sent

use regex::{Regex, RegexBuilder};

/// Rewrites user text before it enters the conversation
pub trait ProfanityFilter: Send + Sync {
    fn sanitize(&self, text: &str) -> String;
}

const DEFAULT_WORDS: &[&str] = &[
    "arse",
    "arsehole",
    "asshole",
    "bastard",
    "bitch",
    "bollocks",
    "bullshit",
    "crap",
    "cunt",
    "damn",
    "dick",
    "fuck",
    "fucker",
    "fucking",
    "motherfucker",
    "piss",
    "prick",
    "shit",
    "shitty",
    "slut",
    "twat",
    "wanker",
    "whore",
];

/// Whole-word, case-insensitive replacement with asterisks of equal length
pub struct WordListFilter {
    pattern: Option<Regex>,
}

impl WordListFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternation = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .map(|w| regex::escape(&w))
            .collect::<Vec<_>>()
            .join("|");

        if alternation.is_empty() {
            return Self { pattern: None };
        }

        let pattern = RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
            .case_insensitive(true)
            .build();

        match pattern {
            Ok(pattern) => Self {
                pattern: Some(pattern),
            },
            Err(e) => {
                // Words are escaped, so this only trips on size limits
                tracing::warn!(error = %e, "Profanity word list rejected, filter disabled");
                Self { pattern: None }
            }
        }
    }

    /// Built-in list plus any extra configured words
    pub fn with_extra_words(extra: &[String]) -> Self {
        Self::new(
            DEFAULT_WORDS
                .iter()
                .copied()
                .chain(extra.iter().map(String::as_str)),
        )
    }
}

impl Default for WordListFilter {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS)
    }
}

impl ProfanityFilter for WordListFilter {
    fn sanitize(&self, text: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern
                .replace_all(text, |caps: &regex::Captures<'_>| {
                    "*".repeat(caps[0].chars().count())
                })
                .into_owned(),
            None => text.to_string(),
        }
    }
}
