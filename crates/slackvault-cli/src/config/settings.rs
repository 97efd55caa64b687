//! Effective settings: command-line flags and environment over the config file.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use slackvault_core::config::{COOKIE_ENV, TOKEN_ENV};
use slackvault_core::{SlackConfig, paths};

use crate::cli::Cli;
use crate::config::CliConfig;

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub struct Settings {
    pub token: Option<String>,
    pub cookie: Option<String>,
    pub api_base_url: Option<String>,
    pub work_dir: PathBuf,
    pub log_level: String,
}

/// First non-blank value, preferring the flag.
fn pick(flag: Option<&str>, file: Option<&str>) -> Option<String> {
    [flag, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

impl Settings {
    pub fn resolve(cli: &Cli, config: &CliConfig) -> Result<Self> {
        let work_dir = match pick(cli.work_dir.as_deref(), config.default.work_dir.as_deref()) {
            Some(dir) => PathBuf::from(dir),
            None => paths::resolve_work_dir()?,
        };

        Ok(Self {
            token: pick(cli.token.as_deref(), config.slack.token.as_deref()),
            cookie: pick(cli.cookie.as_deref(), config.slack.cookie.as_deref()),
            api_base_url: config.slack.api_base_url.clone(),
            work_dir,
            log_level: pick(cli.log_level.as_deref(), config.default.log_level.as_deref())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }

    /// Remote client configuration. A token is required.
    pub fn slack_config(&self) -> Result<SlackConfig> {
        let Some(token) = &self.token else {
            bail!(
                "{TOKEN_ENV} is not set; pass --token, export {TOKEN_ENV} or add token to [slack] in config.toml"
            );
        };

        let mut config = SlackConfig::new(token.clone());
        if let Some(cookie) = &self.cookie {
            config = config.with_cookie(cookie.clone());
        }
        if let Some(url) = &self.api_base_url {
            config = config.with_api_base_url(url.clone());
        }
        config.validate().with_context(|| {
            format!("invalid Slack credentials (see {TOKEN_ENV} and {COOKIE_ENV})")
        })?;
        Ok(config)
    }
}
