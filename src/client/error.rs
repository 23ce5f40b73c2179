//! Error types for the printer backend client.

use thiserror::Error;

/// Errors that can occur while talking to the printer backend.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Request exceeded its deadline
    #[error("request timeout after {0}s")]
    Timeout(u64),

    /// Connection refused, DNS failure, reset, ...
    #[error("connection failed: {0}")]
    Network(String),

    /// Backend answered with a non-success status
    #[error("backend error {status}: {message}")]
    Http { status: u16, message: String },

    /// Body did not match the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Printer id cannot be used as a URL path segment
    #[error("invalid printer id '{0}': only letters, digits, '-', '.', '_' and '~' are allowed")]
    InvalidPrinterId(String),

    /// Client could not be constructed from configuration
    #[error("client configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Classify a reqwest error.
    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_seconds: u64) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(timeout_seconds)
        } else if e.is_decode() {
            ClientError::InvalidResponse(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}
