//! Logical read operations over a workspace.
//!
//! Every remote call goes through [`with_retry`], every operation observes the
//! caller's cancellation token, and channel-shaped responses feed the shared
//! [`ChannelDirectory`].

mod types;

pub use types::*;

use std::sync::Arc;

use slackvault_traits::{
    ArtifactSink, HistoryParams, ListChannelsParams, Message, RepliesParams, SearchParams,
    SearchSort, SlackApi,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::authors::AuthorNames;
use crate::directory::ChannelDirectory;
use crate::error::{Error, Result};
use crate::export::{ChannelExporter, ExportOutcome, ExportRequest};
use crate::html::html_to_text;
use crate::paginate::Paginator;
use crate::retry::with_retry;

const DEFAULT_LIST_TYPES: &str = "public_channel,private_channel";
const DEFAULT_LIST_LIMIT: u32 = 100;
const MAX_LIST_LIMIT: u32 = 1000;
const DEFAULT_HISTORY_LIMIT: u32 = 20;
const MAX_HISTORY_LIMIT: u32 = 100;
const DEFAULT_THREAD_LIMIT: u32 = 100;
const MAX_THREAD_LIMIT: u32 = 1000;
const DEFAULT_SEARCH_COUNT: u32 = 20;
const MAX_SEARCH_COUNT: u32 = 100;
const CANVAS_FILETYPE: &str = "quip";

/// `requested` when it is within `1..=max`, otherwise `default`.
fn bounded(requested: Option<u32>, default: u32, max: u32) -> u32 {
    requested.filter(|n| (1..=max).contains(n)).unwrap_or(default)
}

/// Trimmed, non-empty value of an optional argument.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(value)
}

/// Operations exposed to tools and the command line.
#[derive(Clone)]
pub struct SlackService {
    api: Arc<dyn SlackApi>,
    directory: Arc<ChannelDirectory>,
    sink: Arc<dyn ArtifactSink>,
}

impl SlackService {
    pub fn new(api: Arc<dyn SlackApi>, sink: Arc<dyn ArtifactSink>) -> Self {
        Self::with_directory(api, sink, Arc::new(ChannelDirectory::new()))
    }

    pub fn with_directory(
        api: Arc<dyn SlackApi>,
        sink: Arc<dyn ArtifactSink>,
        directory: Arc<ChannelDirectory>,
    ) -> Self {
        Self {
            api,
            directory,
            sink,
        }
    }

    pub fn directory(&self) -> &Arc<ChannelDirectory> {
        &self.directory
    }

    pub fn sink(&self) -> &Arc<dyn ArtifactSink> {
        &self.sink
    }

    fn resolve_channel(&self, channel: &str) -> Result<String> {
        self.directory.resolve(required(channel, "channel")?)
    }

    /// Fetch one page of the channel listing and write it to the sink.
    pub async fn list_channels(
        &self,
        input: ListChannelsInput,
        cancel: &CancellationToken,
    ) -> Result<ListChannelsOutput> {
        let types = present(&input.types).unwrap_or(DEFAULT_LIST_TYPES);
        let params = ListChannelsParams {
            types: types
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            limit: bounded(input.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT),
            cursor: input.cursor.unwrap_or_default(),
            exclude_archived: false,
        };

        let api = self.api.as_ref();
        let page = with_retry(cancel, "failed to list channels", || {
            api.list_channels(&params)
        })
        .await?;
        self.directory.extend(page.items.iter().cloned());

        let summaries: Vec<ChannelSummary> = page.items.iter().map(ChannelSummary::from).collect();
        let file = self
            .sink
            .write_json("channels", &serde_json::to_value(&summaries)?)
            .await
            .map_err(|e| Error::sink("failed to write response", e))?;

        Ok(ListChannelsOutput {
            file,
            total_count: summaries.len(),
            first_channel: summaries.first().cloned(),
            last_channel: summaries.last().cloned(),
            next_cursor: if page.has_more {
                page.next_cursor
            } else {
                String::new()
            },
        })
    }

    /// Rebuild the channel directory from the full listing.
    pub async fn refresh_channels(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RefreshChannelsOutput> {
        let fetched = self.directory.populate(self.api.as_ref(), cancel).await?;
        Ok(RefreshChannelsOutput {
            fetched,
            known: self.directory.len(),
        })
    }

    /// Read recent messages, newest-first, paging until `limit` is reached.
    pub async fn read_history(
        &self,
        input: ReadHistoryInput,
        cancel: &CancellationToken,
    ) -> Result<ReadHistoryOutput> {
        let channel_id = self.resolve_channel(&input.channel)?;
        let limit = bounded(input.limit, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT) as usize;

        let api = self.api.as_ref();
        let channel = channel_id.clone();
        let oldest = present(&input.oldest).map(str::to_string);
        let latest = present(&input.latest).map(str::to_string);
        let mut pages = Paginator::new(cancel, "failed to get history", move |cursor| {
            let params = HistoryParams {
                channel: channel.clone(),
                limit: limit as u32,
                oldest: oldest.clone(),
                latest: latest.clone(),
                cursor,
            };
            async move { api.history(&params).await }
        });

        let mut messages: Vec<Message> = Vec::with_capacity(limit);
        while messages.len() < limit {
            match pages.next_page().await? {
                Some(page) => messages.extend(page),
                None => break,
            }
        }
        let has_more = messages.len() > limit || !pages.is_exhausted();
        messages.truncate(limit);

        let messages = self.summarize(messages, cancel).await?;
        debug!(channel_id = %channel_id, count = messages.len(), has_more, "Read channel history");
        Ok(ReadHistoryOutput {
            channel_id,
            messages,
            has_more,
        })
    }

    /// Read a whole thread, parent first.
    pub async fn read_thread(
        &self,
        input: ReadThreadInput,
        cancel: &CancellationToken,
    ) -> Result<ReadThreadOutput> {
        let channel_id = self.resolve_channel(&input.channel)?;
        let thread_ts = required(&input.timestamp, "timestamp")?.to_string();
        let limit = bounded(input.limit, DEFAULT_THREAD_LIMIT, MAX_THREAD_LIMIT);

        let api = self.api.as_ref();
        let channel = channel_id.clone();
        let ts = thread_ts.clone();
        let pages = Paginator::new(cancel, "failed to get thread replies", move |cursor| {
            let params = RepliesParams {
                channel: channel.clone(),
                ts: ts.clone(),
                limit,
                cursor,
            };
            async move { api.replies(&params).await }
        });
        let messages = pages.collect_all().await?;

        Ok(ReadThreadOutput {
            channel_id,
            thread_ts,
            messages: self.summarize(messages, cancel).await?,
        })
    }

    /// Attach best-effort author names.
    async fn summarize(
        &self,
        messages: Vec<Message>,
        cancel: &CancellationToken,
    ) -> Result<Vec<MessageSummary>> {
        let user_ids: Vec<String> = messages.iter().map(|m| m.user.clone()).collect();
        let mut names = AuthorNames::new();
        names
            .prefetch(self.api.as_ref(), cancel, &user_ids)
            .await?;
        Ok(messages
            .into_iter()
            .map(|m| {
                let user_name = names.get(&m.user);
                MessageSummary::new(m, user_name)
            })
            .collect())
    }

    pub async fn search_messages(
        &self,
        input: SearchMessagesInput,
        cancel: &CancellationToken,
    ) -> Result<SearchMessagesOutput> {
        let query = required(&input.query, "query")?.to_string();
        let sort = match present(&input.sort) {
            Some("timestamp") => SearchSort::Timestamp,
            _ => SearchSort::Score,
        };
        let params = SearchParams {
            query: query.clone(),
            sort,
            count: bounded(input.count, DEFAULT_SEARCH_COUNT, MAX_SEARCH_COUNT),
        };

        let api = self.api.as_ref();
        let results = with_retry(cancel, "failed to search", || {
            api.search_messages(&params)
        })
        .await?;
        Ok(SearchMessagesOutput {
            query,
            total: results.total,
            matches: results
                .matches
                .into_iter()
                .map(SearchMatchSummary::from)
                .collect(),
        })
    }

    /// Look up a user by ID or by email; exactly one must be given.
    pub async fn get_user(
        &self,
        input: GetUserInput,
        cancel: &CancellationToken,
    ) -> Result<GetUserOutput> {
        let api = self.api.as_ref();
        let user = match (present(&input.user), present(&input.email)) {
            (Some(_), Some(_)) => {
                return Err(Error::Validation(
                    "provide either user or email, not both".to_string(),
                ));
            }
            (None, None) => {
                return Err(Error::Validation(
                    "either user ID or email is required".to_string(),
                ));
            }
            (Some(user_id), None) => {
                with_retry(cancel, "failed to get user", || api.user_info(user_id)).await?
            }
            (None, Some(email)) => {
                with_retry(cancel, "failed to get user", || api.user_by_email(email)).await?
            }
        };
        Ok(GetUserOutput { user: user.into() })
    }

    pub async fn get_permalink(
        &self,
        input: GetPermalinkInput,
        cancel: &CancellationToken,
    ) -> Result<GetPermalinkOutput> {
        let channel_id = self.resolve_channel(&input.channel)?;
        let timestamp = required(&input.timestamp, "timestamp")?.to_string();

        let api = self.api.as_ref();
        let permalink = with_retry(cancel, "failed to get permalink", || {
            api.permalink(&channel_id, &timestamp)
        })
        .await?;
        Ok(GetPermalinkOutput {
            permalink,
            channel: channel_id,
            timestamp,
        })
    }

    /// Download a canvas, render it to text and write it to the sink.
    pub async fn read_canvas(
        &self,
        input: ReadCanvasInput,
        cancel: &CancellationToken,
    ) -> Result<ReadCanvasOutput> {
        let api = self.api.as_ref();
        let file_id = match (present(&input.channel), present(&input.file_id)) {
            (Some(_), Some(_)) => {
                return Err(Error::Validation(
                    "provide either channel or file_id, not both".to_string(),
                ));
            }
            (None, None) => {
                return Err(Error::Validation(
                    "either channel or file_id is required".to_string(),
                ));
            }
            (None, Some(file_id)) => file_id.to_string(),
            (Some(channel), None) => {
                let channel_id = self.directory.resolve(channel)?;
                let info = with_retry(cancel, "failed to get channel info", || {
                    api.channel_info(&channel_id)
                })
                .await?;
                let file_id = info.canvas_file_id().map(str::to_string);
                self.directory.insert(info);
                file_id.ok_or_else(|| {
                    Error::NotFound(format!("channel {channel_id} has no canvas"))
                })?
            }
        };

        let file = with_retry(cancel, "failed to get file info", || api.file_info(&file_id)).await?;
        if file.filetype != CANVAS_FILETYPE {
            return Err(Error::Validation(format!(
                "file is not a canvas (filetype {:?}, expected {:?})",
                file.filetype, CANVAS_FILETYPE
            )));
        }

        let html = with_retry(cancel, "failed to download canvas", || {
            api.download_file(&file.url_private_download)
        })
        .await?;
        let text = html_to_text(&String::from_utf8_lossy(&html));
        let written = self
            .sink
            .write_text("canvas", &text)
            .await
            .map_err(|e| Error::sink("failed to write response", e))?;

        Ok(ReadCanvasOutput {
            file: written,
            file_id,
            title: file.title,
        })
    }

    /// Export a channel's full history, oldest-first, with one file per thread.
    pub async fn export_channel(
        &self,
        input: ExportChannelInput,
        cancel: &CancellationToken,
    ) -> Result<ExportOutcome> {
        let channel_id = self.resolve_channel(&input.channel)?;
        let request = ExportRequest {
            channel_id,
            oldest: present(&input.oldest).map(str::to_string),
            latest: present(&input.latest).map(str::to_string),
        };

        let outcome = ChannelExporter::new(self.api.as_ref(), self.sink.as_ref(), cancel)
            .export(&request)
            .await?;
        info!(
            channel_id = %outcome.channel_id,
            messages = outcome.message_count,
            thread_files = outcome.thread_files.len(),
            "Export written"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_falls_back_outside_range() {
        assert_eq!(bounded(None, 20, 100), 20);
        assert_eq!(bounded(Some(0), 20, 100), 20);
        assert_eq!(bounded(Some(101), 20, 100), 20);
        assert_eq!(bounded(Some(100), 20, 100), 100);
        assert_eq!(bounded(Some(1), 20, 100), 1);
    }

    #[test]
    fn present_ignores_blank_values() {
        assert_eq!(present(&None), None);
        assert_eq!(present(&Some("  ".to_string())), None);
        assert_eq!(present(&Some(" U1 ".to_string())), Some("U1"));
    }
}
