//! Credentials and endpoint settings for the remote client.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";
pub const TOKEN_ENV: &str = "SLACK_TOKEN";
pub const COOKIE_ENV: &str = "SLACK_COOKIE";

/// Browser-session tokens that only work together with the `d` cookie.
const SESSION_TOKEN_PREFIX: &str = "xoxc-";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    format!("slackvault/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    pub token: String,
    #[serde(default)]
    pub cookie: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// Credentials stay out of logs.
impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("token", &"<redacted>")
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl SlackConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            cookie: None,
            api_base_url: default_api_base_url(),
            user_agent: default_user_agent(),
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        let cookie = cookie.into();
        self.cookie = (!cookie.trim().is_empty()).then_some(cookie);
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Build from `SLACK_TOKEN` and `SLACK_COOKIE`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV).unwrap_or_default();
        let mut config = Self::new(token);
        if let Ok(cookie) = std::env::var(COOKIE_ENV) {
            config = config.with_cookie(cookie);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::Config(format!(
                "{TOKEN_ENV} is required (pass --token or set the environment variable)"
            )));
        }
        if self.token.starts_with(SESSION_TOKEN_PREFIX) && self.cookie.is_none() {
            return Err(Error::Config(format!(
                "xoxc tokens require the d cookie (pass --cookie or set {COOKIE_ENV})"
            )));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "api_base_url must be an http(s) URL, got {}",
                self.api_base_url
            )));
        }
        Ok(())
    }

    /// Full URL of a remote method.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base_url.trim_end_matches('/'), method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected() {
        let err = SlackConfig::new("  ").validate().unwrap_err();
        assert!(err.to_string().contains("SLACK_TOKEN"));
    }

    #[test]
    fn session_tokens_need_cookie() {
        assert!(SlackConfig::new("xoxc-123").validate().is_err());
        assert!(SlackConfig::new("xoxc-123").with_cookie("").validate().is_err());
        assert!(
            SlackConfig::new("xoxc-123")
                .with_cookie("xoxd-abc")
                .validate()
                .is_ok()
        );
        assert!(SlackConfig::new("xoxp-123").validate().is_ok());
    }

    #[test]
    fn method_url_joins_cleanly() {
        let config = SlackConfig::new("xoxp-1").with_api_base_url("http://localhost:9999/api/");
        assert_eq!(
            config.method_url("conversations.list"),
            "http://localhost:9999/api/conversations.list"
        );
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let config = SlackConfig::new("xoxc-secret").with_cookie("xoxd-secret");
        let text = format!("{config:?}");
        assert!(!text.contains("secret"));
    }

    #[test]
    fn defaults_apply_when_deserializing() {
        let config: SlackConfig = serde_json::from_str(r#"{"token": "xoxp-1"}"#).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.user_agent.starts_with("slackvault/"));
    }
}
