//! Validation failures: input the user has to correct.

use serde::Deserialize;
use thiserror::Error;

/// One or more human-readable problems, surfaced verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", .messages.join(", "))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    pub fn from_messages(messages: Vec<String>) -> Self {
        Self { messages }
    }

    /// Whether any message mentions `needle` (e.g. a filename)
    pub fn mentions(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.contains(needle))
    }

    /// Parse the backend's `{error: string | [string]}` body.
    ///
    /// Returns `None` when the body is not JSON or carries no `error` field.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ErrorField {
            One(String),
            Many(Vec<String>),
        }

        #[derive(Deserialize)]
        struct ErrorBody {
            error: Option<ErrorField>,
        }

        let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
        let messages = match parsed.error? {
            ErrorField::One(message) => vec![message],
            ErrorField::Many(messages) => messages,
        };
        if messages.is_empty() {
            return None;
        }
        Some(Self { messages })
    }
}
