//! Error types for the Jikan request relay.

use thiserror::Error;

/// HTTP status the upstream API uses to reject over-quota requests.
pub const RATE_LIMIT_STATUS: u16 = 429;

/// Outcome taxonomy for every call that goes through the relay.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response. A 429 that survived every retry also lands here.
    #[error("HTTP error! status: {status}{}", format_detail(.message))]
    Status { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The caller no longer wants the result.
    #[error("Request cancelled")]
    Cancelled,

    #[error("Request queue closed before the call resolved")]
    QueueClosed,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn format_detail(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(" ({})", message)
    }
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(RATE_LIMIT_STATUS)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    /// Only rate-limit rejections are retried; everything else is returned as-is.
    pub fn is_retryable(&self) -> bool {
        self.is_rate_limited()
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::Config(err.to_string())
    }
}
