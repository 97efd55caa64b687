//! Scripted in-memory [`SlackApi`] for tests.
//!
//! Serves channel pages, newest-first history, oldest-first thread replies,
//! users, search results and files from fixtures. Failures can be queued per
//! remote method, and every call is counted.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::api::{HistoryParams, ListChannelsParams, RepliesParams, SearchParams, SlackApi, method};
use crate::error::{Result, SlackError};
use crate::model::{Channel, FileInfo, Message, Page, SearchMatch, SearchResults, User};

const DEFAULT_PAGE_SIZE: usize = 100;

/// In-memory workspace with scripted failures.
#[derive(Default)]
pub struct ScriptedSlack {
    channel_pages: Vec<Vec<Channel>>,
    history: HashMap<String, Vec<Message>>,
    threads: HashMap<(String, String), Vec<Message>>,
    users: HashMap<String, User>,
    search: Vec<SearchMatch>,
    files: HashMap<String, FileInfo>,
    downloads: HashMap<String, Bytes>,
    always_rate_limited: HashMap<&'static str, Duration>,
    trailing_cursor: bool,
    failures: Mutex<HashMap<&'static str, VecDeque<Option<SlackError>>>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl ScriptedSlack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel listing split into the given pages.
    pub fn with_channel_pages(mut self, pages: Vec<Vec<Channel>>) -> Self {
        self.channel_pages = pages;
        self
    }

    pub fn with_channels(self, channels: Vec<Channel>) -> Self {
        self.with_channel_pages(vec![channels])
    }

    /// Channel history, in any order. Served newest-first.
    pub fn with_history(mut self, channel: &str, messages: Vec<Message>) -> Self {
        self.history.insert(channel.to_string(), messages);
        self
    }

    /// Thread contents, parent first, served in the given order.
    pub fn with_thread(mut self, channel: &str, parent_ts: &str, messages: Vec<Message>) -> Self {
        self.threads
            .insert((channel.to_string(), parent_ts.to_string()), messages);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.id.clone(), user);
        self
    }

    pub fn with_search_matches(mut self, matches: Vec<SearchMatch>) -> Self {
        self.search = matches;
        self
    }

    pub fn with_file(mut self, info: FileInfo, content: impl Into<Bytes>) -> Self {
        self.downloads
            .insert(info.url_private_download.clone(), content.into());
        self.files.insert(info.id.clone(), info);
        self
    }

    /// Every call to `remote_method` fails with a rate limit of `retry_after`.
    pub fn rate_limit_always(mut self, remote_method: &'static str, retry_after: Duration) -> Self {
        self.always_rate_limited.insert(remote_method, retry_after);
        self
    }

    /// Final pages report `has_more = false` but still carry a cursor.
    pub fn with_trailing_cursor(mut self) -> Self {
        self.trailing_cursor = true;
        self
    }

    /// Queue a one-shot failure for the next call to `remote_method`.
    pub fn fail_next(&self, remote_method: &'static str, error: SlackError) {
        self.fail_after(remote_method, 0, error);
    }

    /// Let `successes` further calls to `remote_method` through, then fail once.
    pub fn fail_after(&self, remote_method: &'static str, successes: usize, error: SlackError) {
        let mut failures = self.failures.lock();
        let queue = failures.entry(remote_method).or_default();
        queue.extend(std::iter::repeat_with(|| None).take(successes));
        queue.push_back(Some(error));
    }

    /// Number of calls issued to `remote_method` so far.
    pub fn calls(&self, remote_method: &str) -> usize {
        self.calls.lock().get(remote_method).copied().unwrap_or(0)
    }

    fn enter(&self, remote_method: &'static str) -> Result<()> {
        *self.calls.lock().entry(remote_method).or_default() += 1;
        if let Some(retry_after) = self.always_rate_limited.get(remote_method) {
            return Err(SlackError::rate_limited(*retry_after));
        }
        if let Some(error) = self
            .failures
            .lock()
            .get_mut(remote_method)
            .and_then(VecDeque::pop_front)
            .flatten()
        {
            return Err(error);
        }
        Ok(())
    }

    fn page_of<T: Clone>(&self, items: &[T], cursor: &str, limit: u32) -> Result<Page<T>> {
        let start = parse_offset(cursor)?;
        let size = if limit == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            limit as usize
        };
        let end = (start + size).min(items.len());
        let has_more = end < items.len();
        let next_cursor = if has_more {
            format!("offset:{end}")
        } else if self.trailing_cursor {
            "offset:stale".to_string()
        } else {
            String::new()
        };
        Ok(Page {
            items: items.get(start..end).unwrap_or_default().to_vec(),
            has_more,
            next_cursor,
        })
    }

    fn known_channels(&self) -> impl Iterator<Item = &Channel> {
        self.channel_pages.iter().flatten()
    }
}

fn parse_offset(cursor: &str) -> Result<usize> {
    if cursor.is_empty() {
        return Ok(0);
    }
    cursor
        .strip_prefix("offset:")
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| SlackError::api("invalid_cursor"))
}

/// Sort key for `seconds.micros` timestamps.
pub fn ts_key(ts: &str) -> (i64, u32) {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, ""));
    let secs = secs.parse().unwrap_or(0);
    let micros = format!("{frac:0<6}")
        .get(..6)
        .and_then(|f| f.parse().ok())
        .unwrap_or(0);
    (secs, micros)
}

#[async_trait]
impl SlackApi for ScriptedSlack {
    async fn list_channels(&self, params: &ListChannelsParams) -> Result<Page<Channel>> {
        self.enter(method::LIST_CHANNELS)?;
        if self.channel_pages.is_empty() {
            return Ok(Page::last(Vec::new()));
        }
        let index = if params.cursor.is_empty() {
            0
        } else {
            params
                .cursor
                .strip_prefix("page:")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n < self.channel_pages.len())
                .ok_or_else(|| SlackError::api("invalid_cursor"))?
        };
        let next_cursor = if index + 1 < self.channel_pages.len() {
            format!("page:{}", index + 1)
        } else {
            String::new()
        };
        Ok(Page {
            items: self.channel_pages[index].clone(),
            has_more: !next_cursor.is_empty(),
            next_cursor,
        })
    }

    async fn channel_info(&self, channel_id: &str) -> Result<Channel> {
        self.enter(method::CHANNEL_INFO)?;
        self.known_channels()
            .find(|c| c.id == channel_id)
            .cloned()
            .ok_or_else(|| SlackError::api("channel_not_found"))
    }

    async fn history(&self, params: &HistoryParams) -> Result<Page<Message>> {
        self.enter(method::HISTORY)?;
        let Some(messages) = self.history.get(&params.channel) else {
            return Err(SlackError::api("channel_not_found"));
        };
        let oldest = params.oldest.as_deref().map(ts_key);
        let latest = params.latest.as_deref().map(ts_key);
        let mut selected: Vec<Message> = messages
            .iter()
            .filter(|m| oldest.is_none_or(|o| ts_key(&m.ts) > o))
            .filter(|m| latest.is_none_or(|l| ts_key(&m.ts) < l))
            .cloned()
            .collect();
        selected.sort_by_key(|m| std::cmp::Reverse(ts_key(&m.ts)));
        self.page_of(&selected, &params.cursor, params.limit)
    }

    async fn replies(&self, params: &RepliesParams) -> Result<Page<Message>> {
        self.enter(method::REPLIES)?;
        let key = (params.channel.clone(), params.ts.clone());
        let Some(messages) = self.threads.get(&key) else {
            return Err(SlackError::api("thread_not_found"));
        };
        self.page_of(messages, &params.cursor, params.limit)
    }

    async fn user_info(&self, user_id: &str) -> Result<User> {
        self.enter(method::USER_INFO)?;
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| SlackError::api("user_not_found"))
    }

    async fn user_by_email(&self, email: &str) -> Result<User> {
        self.enter(method::USER_BY_EMAIL)?;
        self.users
            .values()
            .find(|u| u.profile.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or_else(|| SlackError::api("users_not_found"))
    }

    async fn search_messages(&self, params: &SearchParams) -> Result<SearchResults> {
        self.enter(method::SEARCH_MESSAGES)?;
        let matches: Vec<SearchMatch> = self
            .search
            .iter()
            .filter(|m| m.text.contains(&params.query))
            .cloned()
            .collect();
        let total = matches.len() as u32;
        Ok(SearchResults {
            total,
            matches: matches.into_iter().take(params.count as usize).collect(),
        })
    }

    async fn permalink(&self, channel_id: &str, ts: &str) -> Result<String> {
        self.enter(method::PERMALINK)?;
        Ok(format!(
            "https://example.slack.com/archives/{}/p{}",
            channel_id,
            ts.replace('.', "")
        ))
    }

    async fn file_info(&self, file_id: &str) -> Result<FileInfo> {
        self.enter(method::FILE_INFO)?;
        self.files
            .get(file_id)
            .cloned()
            .ok_or_else(|| SlackError::api("file_not_found"))
    }

    async fn download_file(&self, url: &str) -> Result<Bytes> {
        self.enter(method::DOWNLOAD_FILE)?;
        self.downloads.get(url).cloned().ok_or(SlackError::Status {
            status: 404,
            body: "not found".to_string(),
        })
    }
}

/// Channel fixture with a normalized name.
pub fn channel(id: &str, name: &str) -> Channel {
    Channel::new(id, name)
}

/// Top-level message fixture.
pub fn message(ts: &str, user: &str, text: &str) -> Message {
    Message::new(ts, user, text)
}

/// Thread parent fixture with `reply_count` replies.
pub fn thread_parent(ts: &str, user: &str, text: &str, reply_count: u32) -> Message {
    let mut parent = Message::new(ts, user, text);
    parent.thread_ts = Some(ts.to_string());
    parent.reply_count = reply_count;
    parent
}

/// Reply fixture inside the thread rooted at `parent_ts`.
pub fn reply(ts: &str, parent_ts: &str, user: &str, text: &str) -> Message {
    let mut reply = Message::new(ts, user, text);
    reply.thread_ts = Some(parent_ts.to_string());
    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_is_served_newest_first_in_pages() {
        let slack = ScriptedSlack::new().with_history(
            "C0000000001",
            vec![
                message("100", "U1", "a"),
                message("102", "U1", "c"),
                message("101", "U1", "b"),
            ],
        );
        let mut params = HistoryParams {
            channel: "C0000000001".to_string(),
            limit: 2,
            ..Default::default()
        };

        let first = slack.history(&params).await.unwrap();
        let ts: Vec<_> = first.items.iter().map(|m| m.ts.as_str()).collect();
        assert_eq!(ts, vec!["102", "101"]);
        assert!(!first.is_last());

        params.cursor = first.next_cursor;
        let second = slack.history(&params).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].ts, "100");
        assert!(second.is_last());
        assert_eq!(slack.calls(method::HISTORY), 2);
    }

    #[tokio::test]
    async fn queued_failure_fires_once() {
        let slack = ScriptedSlack::new().with_user(User::new("U1", "alice"));
        slack.fail_next(method::USER_INFO, SlackError::rate_limited(Duration::from_secs(1)));

        assert!(slack.user_info("U1").await.unwrap_err().is_rate_limited());
        assert_eq!(slack.user_info("U1").await.unwrap().name, "alice");
        assert_eq!(slack.calls(method::USER_INFO), 2);
    }

    #[tokio::test]
    async fn delayed_failure_skips_earlier_calls() {
        let slack = ScriptedSlack::new().with_user(User::new("U1", "alice"));
        slack.fail_after(method::USER_INFO, 1, SlackError::api("internal_error"));

        assert!(slack.user_info("U1").await.is_ok());
        assert!(slack.user_info("U1").await.is_err());
        assert!(slack.user_info("U1").await.is_ok());
    }

    #[test]
    fn ts_key_orders_fractional_timestamps() {
        assert!(ts_key("100.5") > ts_key("100.000100"));
        assert!(ts_key("101") > ts_key("100.999999"));
        assert_eq!(ts_key("1234567890.123456"), (1_234_567_890, 123_456));
    }
}
