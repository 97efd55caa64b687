//! Error taxonomy for the access and export layer.
//!
//! Remote failures are classified exactly once, in [`Error::remote`], as they
//! leave the retrying invoker. Cancellation is its own variant and is never
//! wrapped with operation text.

use slackvault_traits::{SinkError, SlackError};
use thiserror::Error;
use tracing::error;

/// Remote error codes that mean the credentials are unusable, with remediation text.
const AUTH_ERROR_CODES: &[(&str, &str)] = &[
    (
        "invalid_auth",
        "Authentication token is invalid. Please refresh your SLACK_TOKEN and SLACK_COOKIE.",
    ),
    (
        "token_expired",
        "Authentication token has expired. Please refresh your SLACK_TOKEN and SLACK_COOKIE.",
    ),
    (
        "token_revoked",
        "Authentication token has been revoked. Please generate new credentials.",
    ),
    (
        "account_inactive",
        "The Slack account is inactive or disabled.",
    ),
    (
        "not_authed",
        "No authentication token provided. Please set SLACK_TOKEN and SLACK_COOKIE.",
    ),
];

#[derive(Error, Debug)]
pub enum Error {
    #[error("operation cancelled")]
    Cancelled,

    #[error("SLACK AUTHENTICATION ERROR: {guidance} (code: {code})")]
    Auth { code: String, guidance: String },

    #[error(
        "channel not found: {name} (searched {searched} known channels); refresh the channel directory or pass a channel ID"
    )]
    ChannelNotFound { name: String, searched: usize },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{operation}: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: SlackError,
    },

    #[error("{operation}: {source}")]
    Sink {
        operation: &'static str,
        #[source]
        source: SinkError,
    },

    #[error("{operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Classify a terminal remote error for `operation`.
    ///
    /// Known authentication codes become [`Error::Auth`] with remediation text;
    /// everything else keeps its cause under the operation name.
    pub fn remote(operation: &'static str, source: SlackError) -> Self {
        if let Some(code) = source.code()
            && let Some((code, guidance)) = AUTH_ERROR_CODES.iter().find(|(c, _)| *c == code)
        {
            error!(operation, guidance, "Slack authentication failed");
            return Error::Auth {
                code: (*code).to_string(),
                guidance: (*guidance).to_string(),
            };
        }
        Error::Remote { operation, source }
    }

    pub fn sink(operation: &'static str, source: SinkError) -> Self {
        Error::Sink { operation, source }
    }

    pub fn io(operation: &'static str, source: std::io::Error) -> Self {
        Error::Io { operation, source }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth { .. })
    }

    /// Underlying remote error, if this failure came from a remote call.
    pub fn remote_source(&self) -> Option<&SlackError> {
        match self {
            Error::Remote { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
