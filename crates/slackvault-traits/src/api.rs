//! The remote capability set.
//!
//! Everything the access layer needs from the workspace API, expressed as one
//! object-safe trait so the HTTP client and test doubles are interchangeable.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::model::{Channel, Cursor, FileInfo, Message, Page, SearchResults, User};

/// Remote method names, shared by the HTTP client, logs and test doubles.
pub mod method {
    pub const LIST_CHANNELS: &str = "conversations.list";
    pub const CHANNEL_INFO: &str = "conversations.info";
    pub const HISTORY: &str = "conversations.history";
    pub const REPLIES: &str = "conversations.replies";
    pub const USER_INFO: &str = "users.info";
    pub const USER_BY_EMAIL: &str = "users.lookupByEmail";
    pub const SEARCH_MESSAGES: &str = "search.messages";
    pub const PERMALINK: &str = "chat.getPermalink";
    pub const FILE_INFO: &str = "files.info";
    pub const DOWNLOAD_FILE: &str = "files.download";
}

/// Parameters for a channel listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListChannelsParams {
    pub types: Vec<String>,
    pub limit: u32,
    pub cursor: Cursor,
    pub exclude_archived: bool,
}

/// Parameters for a channel history page. History is returned newest-first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryParams {
    pub channel: String,
    pub limit: u32,
    pub oldest: Option<String>,
    pub latest: Option<String>,
    pub cursor: Cursor,
}

/// Parameters for a thread replies page. Replies are returned oldest-first,
/// parent included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepliesParams {
    pub channel: String,
    pub ts: String,
    pub limit: u32,
    pub cursor: Cursor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchSort {
    #[default]
    Score,
    Timestamp,
}

impl SearchSort {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchSort::Score => "score",
            SearchSort::Timestamp => "timestamp",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
    pub sort: SearchSort,
    pub count: u32,
}

/// Read-only workspace operations.
///
/// Implementations report rate limits as [`crate::SlackError::RateLimited`];
/// retrying is the caller's concern.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// List conversations. Exhaustion is signalled by an empty `next_cursor`.
    async fn list_channels(&self, params: &ListChannelsParams) -> Result<Page<Channel>>;

    async fn channel_info(&self, channel_id: &str) -> Result<Channel>;

    async fn history(&self, params: &HistoryParams) -> Result<Page<Message>>;

    async fn replies(&self, params: &RepliesParams) -> Result<Page<Message>>;

    async fn user_info(&self, user_id: &str) -> Result<User>;

    async fn user_by_email(&self, email: &str) -> Result<User>;

    async fn search_messages(&self, params: &SearchParams) -> Result<SearchResults>;

    async fn permalink(&self, channel_id: &str, ts: &str) -> Result<String>;

    async fn file_info(&self, file_id: &str) -> Result<FileInfo>;

    /// Download a private file URL with the caller's credentials.
    async fn download_file(&self, url: &str) -> Result<Bytes>;
}
