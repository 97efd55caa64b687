//! Inputs and outputs of the logical operations.
//!
//! Inputs carry JSON schemas so they can be published as tool parameters.
//! Outputs are plain serde types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use slackvault_traits::{Channel, FileRef, Message, SearchMatch, User};

fn is_zero(n: &u32) -> bool {
    *n == 0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListChannelsInput {
    /// Channel types: public_channel, private_channel, mpim, im (comma-separated). Default: public_channel,private_channel
    #[serde(default)]
    pub types: Option<String>,
    /// Max channels to return (default 100, max 1000)
    #[serde(default)]
    pub limit: Option<u32>,
    /// Pagination cursor for fetching more results
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub topic: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub purpose: String,
    pub member_count: u32,
    pub is_private: bool,
    pub is_archived: bool,
}

impl From<&Channel> for ChannelSummary {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.id.clone(),
            name: channel.name.clone(),
            topic: channel.topic.value.clone(),
            purpose: channel.purpose.value.clone(),
            member_count: channel.member_count,
            is_private: channel.is_private,
            is_archived: channel.is_archived,
        }
    }
}

/// Summary of one listing page. The full page is in `file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListChannelsOutput {
    pub file: FileRef,
    pub total_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_channel: Option<ChannelSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_channel: Option<ChannelSummary>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next_cursor: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RefreshChannelsInput {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshChannelsOutput {
    /// Channels returned by the listing.
    pub fetched: usize,
    /// Channels known to the directory afterwards.
    pub known: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReadHistoryInput {
    /// Channel ID or name (e.g., C1234567890 or #general)
    pub channel: String,
    /// Number of messages to fetch (default 20, max 100)
    #[serde(default)]
    pub limit: Option<u32>,
    /// Start of time range (Unix timestamp)
    #[serde(default)]
    pub oldest: Option<String>,
    /// End of time range (Unix timestamp)
    #[serde(default)]
    pub latest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub timestamp: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_name: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub reply_count: u32,
}

impl MessageSummary {
    pub fn new(message: Message, user_name: String) -> Self {
        Self {
            timestamp: message.ts,
            user: message.user,
            user_name,
            text: message.text,
            thread_ts: message.thread_ts.filter(|ts| !ts.is_empty()),
            reply_count: message.reply_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadHistoryOutput {
    pub channel_id: String,
    pub messages: Vec<MessageSummary>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReadThreadInput {
    /// Channel ID or name
    pub channel: String,
    /// Thread parent message timestamp (e.g., 1234567890.123456)
    pub timestamp: String,
    /// Replies requested per page (default 100, max 1000)
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadThreadOutput {
    pub channel_id: String,
    pub thread_ts: String,
    /// Parent first, then replies oldest-first.
    pub messages: Vec<MessageSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchMessagesInput {
    /// Search query (supports modifiers like from:@user, in:#channel, before:date)
    pub query: String,
    /// Number of results to return (default 20, max 100)
    #[serde(default)]
    pub count: Option<u32>,
    /// Sort order: score (relevance) or timestamp (recent first)
    #[serde(default)]
    pub sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatchSummary {
    pub timestamp: String,
    pub channel: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_name: String,
    pub text: String,
    pub permalink: String,
}

impl From<SearchMatch> for SearchMatchSummary {
    fn from(found: SearchMatch) -> Self {
        Self {
            timestamp: found.ts,
            channel: found.channel.name,
            user: found.user,
            user_name: found.username,
            text: found.text,
            permalink: found.permalink,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMessagesOutput {
    pub query: String,
    pub total: u32,
    pub matches: Vec<SearchMatchSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetUserInput {
    /// User ID (e.g., U1234567890)
    #[serde(default)]
    pub user: Option<String>,
    /// User email address
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub real_name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status_emoji: String,
    pub is_bot: bool,
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timezone: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            real_name: user.real_name,
            display_name: user.profile.display_name,
            email: user.profile.email,
            title: user.profile.title,
            status: user.profile.status_text,
            status_emoji: user.profile.status_emoji,
            is_bot: user.is_bot,
            is_admin: user.is_admin,
            timezone: user.tz,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUserOutput {
    pub user: UserSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetPermalinkInput {
    /// Channel ID or name
    pub channel: String,
    /// Message timestamp (e.g., 1234567890.123456)
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPermalinkOutput {
    pub permalink: String,
    pub channel: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReadCanvasInput {
    /// Channel ID or name (for channel canvases)
    #[serde(default)]
    pub channel: Option<String>,
    /// Canvas file ID (for standalone canvases)
    #[serde(default)]
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadCanvasOutput {
    pub file: FileRef,
    pub file_id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExportChannelInput {
    /// Channel ID or name
    pub channel: String,
    /// Start of time range (Unix timestamp)
    #[serde(default)]
    pub oldest: Option<String>,
    /// End of time range (Unix timestamp)
    #[serde(default)]
    pub latest: Option<String>,
}
