/*
[INPUT]:  Error sources (HTTP, API, auth, WebSocket, stream delivery)
[OUTPUT]: Structured error types with retry/auth classification
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or changing retry classification
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the KuCoin stream adapter
#[derive(Error, Debug)]
pub enum KucoinError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error envelope
    #[error("API error (code {code}): {message}")]
    Api { code: String, message: String },

    /// Authentication failed (bad or missing credentials)
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Token service or socket handshake unreachable
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },

    /// Live socket died mid-stream
    #[error("Connection lost: {message}")]
    ConnectionLost { message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Inbound frame failed to decode as JSON
    #[error("Frame parse error: {message}")]
    Parse { message: String },

    /// Consumer callback failed
    #[error("Consumer callback failed: {message}")]
    Callback { message: String },

    /// Inbound frame queue closed while the producer was still live
    #[error("Inbound frame queue closed")]
    QueueClosed,

    /// WebSocket protocol or transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation timed out
    #[error("Timeout after {duration}s")]
    Timeout { duration: u64 },
}

impl KucoinError {
    /// Check if the error is retryable with a fresh connection attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            KucoinError::Http(_)
                | KucoinError::UpstreamUnavailable { .. }
                | KucoinError::ConnectionLost { .. }
                | KucoinError::WebSocket(_)
                | KucoinError::Timeout { .. }
        )
    }

    /// Check if error indicates authentication failure (never retried)
    pub fn is_auth_error(&self) -> bool {
        matches!(self, KucoinError::Auth { .. })
    }

    /// Create an auth error with a message
    pub fn auth(message: impl Into<String>) -> Self {
        KucoinError::Auth { message: message.into() }
    }

    /// Create an API error from an HTTP status and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        KucoinError::Api {
            code: status.as_u16().to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, KucoinError>;
