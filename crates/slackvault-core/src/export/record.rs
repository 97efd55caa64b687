//! Line records and counters for channel exports.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use slackvault_traits::{Message, Reaction};

/// Render a `seconds.micros` message timestamp as an ISO-8601 UTC string.
///
/// Unparseable input is returned unchanged.
pub fn iso_timestamp(ts: &str) -> String {
    if ts.is_empty() {
        return String::new();
    }
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, ""));
    let Ok(secs) = secs.parse::<i64>() else {
        return ts.to_string();
    };
    let micros = if frac.is_empty() {
        0
    } else if frac.len() <= 6 && frac.bytes().all(|b| b.is_ascii_digit()) {
        format!("{frac:0<6}").parse::<u32>().unwrap_or(0)
    } else {
        return ts.to_string();
    };
    match DateTime::from_timestamp(secs, micros * 1_000) {
        Some(time) => time.to_rfc3339_opts(SecondsFormat::Micros, true),
        None => ts.to_string(),
    }
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// One message as written to an export file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub timestamp: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_name: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub reply_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<Reaction>,
}

impl ExportRecord {
    /// Build a record for `message`. `parent_ts` is set for thread replies only.
    pub fn new(message: &Message, parent_ts: Option<&str>, user_name: String) -> Self {
        Self {
            timestamp: iso_timestamp(&message.ts),
            user: message.user.clone(),
            user_name,
            text: message.text.clone(),
            thread_ts: parent_ts.map(iso_timestamp),
            reply_count: message.reply_count,
            reactions: message.reactions.clone(),
        }
    }
}

/// Running counters for one export invocation.
#[derive(Debug, Clone, Default)]
pub struct ExportStats {
    pub message_count: usize,
    pub thread_count: usize,
    pub reaction_count: u64,
    authors: HashSet<String>,
}

impl ExportStats {
    /// Count one exported message: its author and its reactions.
    pub fn record(&mut self, message: &Message) {
        self.message_count += 1;
        self.reaction_count += message.reaction_total();
        if !message.user.is_empty() {
            self.authors.insert(message.user.clone());
        }
    }

    pub fn unique_authors(&self) -> usize {
        self.authors.len()
    }
}

#[cfg(test)]
mod tests {
    use slackvault_traits::testing::{message, reply};

    use super::*;

    #[test]
    fn iso_timestamps_keep_microseconds() {
        assert_eq!(
            iso_timestamp("1700000000.123456"),
            "2023-11-14T22:13:20.123456Z"
        );
        assert_eq!(iso_timestamp("100"), "1970-01-01T00:01:40.000000Z");
        assert_eq!(iso_timestamp("100.5"), "1970-01-01T00:01:40.500000Z");
        assert_eq!(iso_timestamp("not-a-ts"), "not-a-ts");
        assert_eq!(iso_timestamp(""), "");
    }

    #[test]
    fn optional_fields_are_omitted() {
        let record = ExportRecord::new(&message("100", "U1", "hello"), None, String::new());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "timestamp": "1970-01-01T00:01:40.000000Z",
                "user": "U1",
                "text": "hello",
            })
        );
    }

    #[test]
    fn replies_carry_parent_and_reactions() {
        let mut msg = reply("101", "100", "U2", "+1");
        msg.reactions = vec![Reaction {
            name: "tada".to_string(),
            count: 3,
        }];
        let record = ExportRecord::new(&msg, Some("100"), "bob".to_string());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["user_name"], "bob");
        assert_eq!(json["thread_ts"], "1970-01-01T00:01:40.000000Z");
        assert_eq!(json["reactions"][0]["count"], 3);
        assert!(json.get("reply_count").is_none());
    }

    #[test]
    fn stats_track_distinct_authors() {
        let mut stats = ExportStats::default();
        let mut liked = message("100", "U1", "a");
        liked.reactions = vec![
            Reaction {
                name: "eyes".to_string(),
                count: 2,
            },
            Reaction {
                name: "tada".to_string(),
                count: 1,
            },
        ];
        stats.record(&liked);
        stats.record(&message("101", "U1", "b"));
        stats.record(&message("102", "U2", "c"));
        stats.record(&message("103", "", "bot"));

        assert_eq!(stats.message_count, 4);
        assert_eq!(stats.reaction_count, 3);
        assert_eq!(stats.unique_authors(), 2);
    }
}
