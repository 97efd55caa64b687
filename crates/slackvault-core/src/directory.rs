//! Bidirectional channel directory.
//!
//! Resolves human channel names to IDs locally. Population pages through the
//! full listing and installs the result under a single write lock, so
//! concurrent readers observe either the old or the new state.

use std::collections::HashMap;

use parking_lot::RwLock;
use slackvault_traits::{Channel, ListChannelsParams, SlackApi};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::paginate::Paginator;

/// Channel types requested during population.
pub const DIRECTORY_CHANNEL_TYPES: [&str; 2] = ["public_channel", "private_channel"];

/// Page size used during population.
pub const DIRECTORY_PAGE_SIZE: u32 = 1000;

/// Structural test for channel IDs: at least nine characters, a `C`, `D` or
/// `G` type prefix, and only uppercase ASCII letters and digits.
pub fn is_channel_id(s: &str) -> bool {
    s.len() >= 9
        && matches!(s.as_bytes()[0], b'C' | b'D' | b'G')
        && s.bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

#[derive(Default)]
struct Maps {
    by_name: HashMap<String, Channel>,
    by_id: HashMap<String, Channel>,
}

impl Maps {
    fn insert(&mut self, channel: Channel) {
        if channel.id.is_empty() {
            return;
        }
        let name = channel.lookup_name();
        if !name.is_empty() {
            self.by_name.insert(name, channel.clone());
        }
        self.by_id.insert(channel.id.to_lowercase(), channel);
    }
}

/// Lock-guarded index of channels by normalized name and lowercased ID.
///
/// Entries are never removed; re-inserting a channel replaces the previous
/// entry for both keys.
#[derive(Default)]
pub struct ChannelDirectory {
    maps: RwLock<Maps>,
}

impl ChannelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh one channel.
    pub fn insert(&self, channel: Channel) {
        self.maps.write().insert(channel);
    }

    /// Insert a batch atomically with respect to readers.
    pub fn extend(&self, channels: impl IntoIterator<Item = Channel>) {
        let mut maps = self.maps.write();
        for channel in channels {
            maps.insert(channel);
        }
    }

    pub fn by_name(&self, name: &str) -> Option<Channel> {
        self.maps.read().by_name.get(&name.to_lowercase()).cloned()
    }

    pub fn by_id(&self, id: &str) -> Option<Channel> {
        self.maps.read().by_id.get(&id.to_lowercase()).cloned()
    }

    /// Number of distinct channel IDs known.
    pub fn len(&self) -> usize {
        self.maps.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a channel reference to its ID.
    ///
    /// ID-shaped input is returned unchanged without consulting the maps.
    /// Names may carry a leading `#` and are matched case-insensitively.
    pub fn resolve(&self, reference: &str) -> Result<String> {
        let reference = reference.trim();
        if is_channel_id(reference) {
            return Ok(reference.to_string());
        }

        let name = reference.strip_prefix('#').unwrap_or(reference).to_lowercase();
        let maps = self.maps.read();
        match maps.by_name.get(&name) {
            Some(channel) => Ok(channel.id.clone()),
            None => Err(Error::ChannelNotFound {
                name,
                searched: maps.by_name.len(),
            }),
        }
    }

    /// Page through the full channel listing, archived channels included, and
    /// install every result. Returns the number of channels fetched.
    pub async fn populate(&self, api: &dyn SlackApi, cancel: &CancellationToken) -> Result<usize> {
        info!("Populating channel directory");
        let pages = Paginator::new(cancel, "failed to list channels", move |cursor| {
            let params = ListChannelsParams {
                types: DIRECTORY_CHANNEL_TYPES.iter().map(|t| t.to_string()).collect(),
                limit: DIRECTORY_PAGE_SIZE,
                cursor,
                exclude_archived: false,
            };
            async move { api.list_channels(&params).await }
        });
        let channels = pages.collect_all().await?;
        let fetched = channels.len();

        self.extend(channels);
        let known = self.len();
        debug!(fetched, known, "Channel directory updated");
        info!(fetched, "Channel directory populated");
        Ok(fetched)
    }
}
