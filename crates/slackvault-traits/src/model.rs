//! Data model for channels, messages, users and files.
//!
//! Field names follow the remote payloads so the HTTP client can deserialize
//! responses directly; every optional field defaults when absent.

use serde::{Deserialize, Serialize};

/// Opaque pagination token issued by the server. Empty means "no more pages".
pub type Cursor = String;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub next_cursor: Cursor,
}

impl<T> Page<T> {
    /// A page with no continuation.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            has_more: false,
            next_cursor: String::new(),
        }
    }

    /// True when the server signals exhaustion through either channel.
    ///
    /// Some endpoints only clear `has_more`, others only return an empty
    /// cursor, so both are checked.
    pub fn is_last(&self) -> bool {
        !self.has_more || self.next_cursor.is_empty()
    }
}

/// Free-text channel attribute (topic, purpose).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelText {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasRef {
    #[serde(default)]
    pub file_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelProperties {
    #[serde(default)]
    pub canvas: Option<CanvasRef>,
}

/// A conversation: public channel (`C…`), private group (`G…`) or direct message (`D…`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub name_normalized: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default, rename = "num_members")]
    pub member_count: u32,
    #[serde(default)]
    pub topic: ChannelText,
    #[serde(default)]
    pub purpose: ChannelText,
    #[serde(default)]
    pub properties: Option<ChannelProperties>,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            name_normalized: name.to_lowercase(),
            name,
            ..Default::default()
        }
    }

    /// Key used for name lookups: the normalized name, falling back to the
    /// display name, case-folded.
    pub fn lookup_name(&self) -> String {
        if self.name_normalized.is_empty() {
            self.name.to_lowercase()
        } else {
            self.name_normalized.to_lowercase()
        }
    }

    /// File ID of the channel canvas, if one is attached.
    pub fn canvas_file_id(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.canvas.as_ref())
            .map(|c| c.file_id.as_str())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    #[serde(default)]
    pub count: u32,
}

/// A single message. `ts` is the message identifier, its sort key and its
/// send time (`seconds.micros` since the epoch) at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub ts: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub reply_count: u32,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl Message {
    pub fn new(ts: impl Into<String>, user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            ts: ts.into(),
            user: user.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn is_thread_parent(&self) -> bool {
        self.reply_count > 0
    }

    /// Parent timestamp when this message is a reply inside someone else's thread.
    pub fn parent_ts(&self) -> Option<&str> {
        self.thread_ts
            .as_deref()
            .filter(|parent| !parent.is_empty() && *parent != self.ts)
    }

    pub fn reaction_total(&self) -> u64 {
        self.reactions.iter().map(|r| u64::from(r.count)).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub status_emoji: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub real_name: String,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub tz: String,
    #[serde(default)]
    pub profile: UserProfile,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchChannel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub ts: String,
    #[serde(default)]
    pub channel: SearchChannel,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub permalink: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub total: u32,
    pub matches: Vec<SearchMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub filetype: String,
    #[serde(default)]
    pub url_private_download: String,
    #[serde(default)]
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_is_last_checks_both_signals() {
        let mut page: Page<u8> = Page {
            items: vec![1],
            has_more: true,
            next_cursor: "abc".to_string(),
        };
        assert!(!page.is_last());

        page.next_cursor.clear();
        assert!(page.is_last(), "empty cursor ends pagination");

        page.next_cursor = "abc".to_string();
        page.has_more = false;
        assert!(page.is_last(), "has_more=false ends pagination");
    }

    #[test]
    fn channel_deserializes_remote_shape() {
        let channel: Channel = serde_json::from_value(serde_json::json!({
            "id": "C012AB3CD",
            "name": "General",
            "name_normalized": "general",
            "is_private": false,
            "num_members": 42,
            "topic": {"value": "Company-wide", "creator": "U1"},
            "properties": {"canvas": {"file_id": "F0CANVAS1"}}
        }))
        .unwrap();

        assert_eq!(channel.member_count, 42);
        assert_eq!(channel.topic.value, "Company-wide");
        assert_eq!(channel.lookup_name(), "general");
        assert_eq!(channel.canvas_file_id(), Some("F0CANVAS1"));
    }

    #[test]
    fn lookup_name_falls_back_to_display_name() {
        let channel = Channel {
            id: "C012AB3CD".to_string(),
            name: "Random".to_string(),
            ..Default::default()
        };
        assert_eq!(channel.lookup_name(), "random");
    }

    #[test]
    fn parent_ts_ignores_self_reference() {
        let mut parent = Message::new("100.000001", "U1", "root");
        parent.thread_ts = Some("100.000001".to_string());
        parent.reply_count = 2;
        assert!(parent.is_thread_parent());
        assert_eq!(parent.parent_ts(), None);

        let mut reply = Message::new("101.000001", "U2", "reply");
        reply.thread_ts = Some("100.000001".to_string());
        assert_eq!(reply.parent_ts(), Some("100.000001"));
    }

    #[test]
    fn reaction_total_sums_counts() {
        let mut message = Message::new("1.0", "U1", "hi");
        message.reactions = vec![
            Reaction {
                name: "thumbsup".to_string(),
                count: 3,
            },
            Reaction {
                name: "heart".to_string(),
                count: 2,
            },
        ];
        assert_eq!(message.reaction_total(), 5);
    }
}
