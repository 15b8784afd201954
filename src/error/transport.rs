//! Transport-level failures.
//!
//! Anything that prevented a usable answer from the backend: the request never
//! completed, the status was not 2xx and carried no structured error, or the
//! body could not be decoded.

use thiserror::Error;

use crate::traits::HttpError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed to '{url}': {message}")]
    ConnectionFailed { url: String, message: String },

    #[error("Request to '{url}' timed out")]
    Timeout { url: String },

    #[error("HTTP {status} error: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Transport error: {message}")]
    Other { message: String },
}

impl TransportError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed { .. } => true,
            TransportError::Timeout { .. } => true,
            TransportError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            TransportError::InvalidResponse { .. } => false,
            TransportError::Other { .. } => true,
        }
    }

    /// Generic message shown to users; details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::ConnectionFailed { .. } | TransportError::Timeout { .. } => {
                "Unable to reach the server. Please check your connection and try again."
                    .to_string()
            }
            TransportError::HttpStatus { status, .. } => match *status {
                403 => "The request was refused. Please reload and try again.".to_string(),
                404 => "The requested resource was not found.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 => {
                    "The server is experiencing issues. Please try again later.".to_string()
                }
                _ => format!(
                    "The server returned an error (HTTP {}). Please try again.",
                    status
                ),
            },
            TransportError::InvalidResponse { .. } => {
                "Received an invalid response from the server. Please try again.".to_string()
            }
            TransportError::Other { .. } => {
                "A network error occurred. Please try again.".to_string()
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::ConnectionFailed { .. } => "E_TRANSPORT_CONN",
            TransportError::Timeout { .. } => "E_TRANSPORT_TIMEOUT",
            TransportError::HttpStatus { .. } => "E_TRANSPORT_HTTP",
            TransportError::InvalidResponse { .. } => "E_TRANSPORT_INVALID",
            TransportError::Other { .. } => "E_TRANSPORT_OTHER",
        }
    }

    /// Attach the request URL to an adapter-level error.
    pub fn from_http(err: HttpError, url: &str) -> Self {
        match err {
            HttpError::ConnectionFailed(message) => TransportError::ConnectionFailed {
                url: url.to_string(),
                message,
            },
            HttpError::Timeout(_) => TransportError::Timeout {
                url: url.to_string(),
            },
            HttpError::ServerError { status, message } => {
                TransportError::HttpStatus { status, message }
            }
            HttpError::InvalidUrl(message) => TransportError::Other {
                message: format!("invalid URL '{}': {}", url, message),
            },
            HttpError::Io(message) | HttpError::Other(message) => {
                TransportError::Other { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let status = |status| TransportError::HttpStatus {
            status,
            message: String::new(),
        };
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(404).is_retryable());
    }

    #[test]
    fn test_from_http_keeps_url() {
        let err = TransportError::from_http(
            HttpError::ConnectionFailed("refused".to_string()),
            "http://localhost:1/api",
        );
        assert_eq!(
            err,
            TransportError::ConnectionFailed {
                url: "http://localhost:1/api".to_string(),
                message: "refused".to_string(),
            }
        );
        assert!(err.to_string().contains("localhost:1"));
    }

    #[test]
    fn test_user_message_hides_details() {
        let err = TransportError::HttpStatus {
            status: 502,
            message: "<html>bad gateway</html>".to_string(),
        };
        assert!(!err.user_message().contains("html"));
    }
}
