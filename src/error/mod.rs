//! Error handling for the board client.
//!
//! | Variant | Category | Retryable | Shown to user |
//! |---------|----------|-----------|---------------|
//! | Transport | Network / Server / Client | Mostly | Generic message |
//! | Validation | User | No | Verbatim |
//!
//! A response that arrives after a newer fetch was issued is not an error at
//! all: the coordinator reports it as a discarded outcome and logs it.

mod category;
mod transport;
mod validation;

pub use category::ErrorCategory;
pub use transport::TransportError;
pub use validation::ValidationError;

use thiserror::Error;

use crate::traits::HttpError;

/// Unified error type for board operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Type alias for Results using BoardError.
pub type BoardResult<T> = Result<T, BoardError>;

impl BoardError {
    pub fn validation(message: impl Into<String>) -> Self {
        BoardError::Validation(ValidationError::new(message))
    }

    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            BoardError::Transport(TransportError::ConnectionFailed { .. })
            | BoardError::Transport(TransportError::Timeout { .. })
            | BoardError::Transport(TransportError::Other { .. }) => ErrorCategory::Network,
            BoardError::Transport(TransportError::HttpStatus { .. }) => ErrorCategory::Server,
            BoardError::Transport(TransportError::InvalidResponse { .. }) => {
                ErrorCategory::Client
            }
            BoardError::Validation(_) => ErrorCategory::User,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            BoardError::Transport(err) => err.is_retryable(),
            BoardError::Validation(_) => false,
        }
    }

    /// Get a user-facing message: generic for transport, verbatim for validation.
    pub fn user_message(&self) -> String {
        match self {
            BoardError::Transport(err) => err.user_message(),
            BoardError::Validation(err) => format!("Error: {}", err),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            BoardError::Transport(err) => err.error_code(),
            BoardError::Validation(_) => "E_VALIDATION",
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}

impl From<HttpError> for BoardError {
    fn from(err: HttpError) -> Self {
        BoardError::Transport(TransportError::from_http(err, ""))
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(err: serde_json::Error) -> Self {
        BoardError::Transport(TransportError::InvalidResponse {
            message: err.to_string(),
        })
    }
}
