//! CLI setup module
//!
//! Builds the remote client, the response sink and the operations service.

use std::sync::Arc;

use anyhow::{Context, Result};
use slackvault_core::{DiskSink, SlackHttpClient, SlackService, is_channel_id, paths};
use slackvault_traits::SlackApi;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::Settings;

/// Build the operations service for `settings`.
pub async fn prepare_service(settings: &Settings) -> Result<SlackService> {
    let client = SlackHttpClient::new(settings.slack_config()?)
        .context("failed to create Slack client")?;
    let responses = paths::responses_dir(&settings.work_dir)?;
    let sink = DiskSink::create(&responses)
        .await
        .with_context(|| format!("failed to open response directory {}", responses.display()))?;

    let api: Arc<dyn SlackApi> = Arc::new(client);
    Ok(SlackService::new(api, Arc::new(sink)))
}

/// Populate the channel directory when a command refers to a channel by name.
pub async fn ensure_directory(
    service: &SlackService,
    channel: Option<&str>,
    cancel: &CancellationToken,
) -> Result<()> {
    let Some(channel) = channel.map(str::trim) else {
        return Ok(());
    };
    if channel.is_empty() || is_channel_id(channel) || !service.directory().is_empty() {
        return Ok(());
    }
    debug!(channel, "Populating channel directory for name lookup");
    service
        .refresh_channels(cancel)
        .await
        .context("failed to load channel directory")?;
    Ok(())
}
