//! Error types for remote calls and output sinks.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single remote call.
///
/// Rate limits are a distinct variant so callers can wait and retry without
/// inspecting message text. Everything else is opaque to the retry layer.
#[derive(Error, Debug)]
pub enum SlackError {
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("slack api error: {code}")]
    Api { code: String },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl SlackError {
    pub fn api(code: impl Into<String>) -> Self {
        Self::Api { code: code.into() }
    }

    pub fn rate_limited(retry_after: Duration) -> Self {
        Self::RateLimited { retry_after }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Server-specified wait before the call may be re-issued.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Remote error code for `ok: false` payloads.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code } => Some(code),
            _ => None,
        }
    }
}

/// Result type alias for remote operations
pub type Result<T> = std::result::Result<T, SlackError>;

/// Failure writing an artifact through a sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for sink operations
pub type SinkResult<T> = std::result::Result<T, SinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_exposes_retry_after() {
        let err = SlackError::rate_limited(Duration::from_secs(3));
        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
        assert_eq!(err.code(), None);
    }

    #[test]
    fn api_error_is_not_rate_limited() {
        let err = SlackError::api("channel_not_found");
        assert!(!err.is_rate_limited());
        assert_eq!(err.retry_after(), None);
        assert_eq!(err.code(), Some("channel_not_found"));
        assert_eq!(err.to_string(), "slack api error: channel_not_found");
    }
}
