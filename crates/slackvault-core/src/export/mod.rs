//! Chronological channel export.
//!
//! History arrives newest-first. The forward pass streams it page by page
//! into a scratch file and records where every line starts. The reversal
//! pass then copies those lines back in reverse order into the main file,
//! so the archive reads oldest-first without holding the history in memory.
//! Thread parents discovered on the way get one file each, written in the
//! order the remote returns replies.

mod record;

pub use record::{ExportRecord, ExportStats, iso_timestamp};

use std::io::SeekFrom;

use serde::{Deserialize, Serialize};
use slackvault_traits::{
    ArtifactSink, FileRef, HistoryParams, Message, RepliesParams, SlackApi,
};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, AsyncWriteExt, BufReader, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::authors::AuthorNames;
use crate::error::{Error, Result};
use crate::paginate::Paginator;
use crate::sink::unix_nanos;

/// Page size for history and reply listings during export.
pub const EXPORT_PAGE_SIZE: u32 = 200;

/// What to export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRequest {
    pub channel_id: String,
    pub oldest: Option<String>,
    pub latest: Option<String>,
}

impl ExportRequest {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            ..Default::default()
        }
    }
}

/// Files and counters produced by one export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub file: FileRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thread_files: Vec<FileRef>,
    pub channel_id: String,
    pub message_count: usize,
    pub thread_count: usize,
    pub reaction_count: u64,
    pub unique_users: usize,
}

/// Main export file name for `channel_id`.
pub fn export_file_name(channel_id: &str) -> String {
    format!("export-{}-{}.jsonl", channel_id, unix_nanos())
}

/// Thread export file name for the thread rooted at `parent_ts`.
pub fn thread_file_name(channel_id: &str, parent_ts: &str) -> String {
    format!("export-{channel_id}-thread-{parent_ts}.jsonl")
}

/// Scratch output of the forward pass. The file is deleted when this drops.
struct Scratch {
    path: TempPath,
    offsets: Vec<u64>,
    parents: Vec<Message>,
}

/// Runs one export against a remote and a sink.
///
/// Stats and the author-name cache live for a single [`ChannelExporter::export`]
/// call and are never shared.
pub struct ChannelExporter<'a> {
    api: &'a dyn SlackApi,
    sink: &'a dyn ArtifactSink,
    cancel: &'a CancellationToken,
    page_size: u32,
}

impl<'a> ChannelExporter<'a> {
    pub fn new(
        api: &'a dyn SlackApi,
        sink: &'a dyn ArtifactSink,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            api,
            sink,
            cancel,
            page_size: EXPORT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Export the channel. The scratch file is removed on every exit path;
    /// thread files already written when a later step fails are left in place.
    pub async fn export(&self, request: &ExportRequest) -> Result<ExportOutcome> {
        let channel_id = request.channel_id.as_str();
        info!(channel_id, "Starting channel export");

        let mut stats = ExportStats::default();
        let mut names = AuthorNames::new();

        let scratch = self.forward_pass(request, &mut stats, &mut names).await?;
        let file = self.reverse_pass(channel_id, &scratch).await?;
        let Scratch { path, parents, .. } = scratch;
        drop(path);

        let mut thread_files = Vec::with_capacity(parents.len());
        for parent in &parents {
            let thread_file = self
                .write_thread(channel_id, parent, &mut stats, &mut names)
                .await?;
            thread_files.push(thread_file);
        }

        info!(
            channel_id,
            messages = stats.message_count,
            threads = stats.thread_count,
            file = %file.path.display(),
            "Channel export finished"
        );
        Ok(ExportOutcome {
            file,
            thread_files,
            channel_id: channel_id.to_string(),
            message_count: stats.message_count,
            thread_count: stats.thread_count,
            reaction_count: stats.reaction_count,
            unique_users: stats.unique_authors(),
        })
    }

    /// Stream history newest-first into a scratch file, recording line offsets.
    async fn forward_pass(
        &self,
        request: &ExportRequest,
        stats: &mut ExportStats,
        names: &mut AuthorNames,
    ) -> Result<Scratch> {
        let temp = tempfile::Builder::new()
            .prefix("export-tmp-")
            .suffix(".jsonl")
            .tempfile_in(self.sink.dir())
            .map_err(|e| Error::io("failed to create temp file", e))?;
        let (file, path) = temp.into_parts();
        let mut writer = BufWriter::new(File::from_std(file));

        let api = self.api;
        let channel = request.channel_id.clone();
        let oldest = request.oldest.clone();
        let latest = request.latest.clone();
        let limit = self.page_size;
        let mut pages = Paginator::new(self.cancel, "failed to get history", move |cursor| {
            let params = HistoryParams {
                channel: channel.clone(),
                limit,
                oldest: oldest.clone(),
                latest: latest.clone(),
                cursor,
            };
            async move { api.history(&params).await }
        });

        let mut offsets = Vec::new();
        let mut parents = Vec::new();
        let mut position = 0u64;
        while let Some(page) = pages.next_page().await? {
            debug!(
                channel_id = %request.channel_id,
                messages = page.len(),
                "Writing history page to scratch file"
            );
            for message in page {
                stats.record(&message);
                let user_name = names.name_of(self.api, self.cancel, &message.user).await?;
                let line = serde_json::to_vec(&ExportRecord::new(&message, None, user_name))?;

                offsets.push(position);
                writer
                    .write_all(&line)
                    .await
                    .map_err(|e| Error::io("failed to write temp file", e))?;
                writer
                    .write_all(b"\n")
                    .await
                    .map_err(|e| Error::io("failed to write temp file", e))?;
                position += line.len() as u64 + 1;

                if message.is_thread_parent() {
                    stats.thread_count += 1;
                    parents.push(message);
                }
            }
        }

        writer
            .flush()
            .await
            .map_err(|e| Error::io("failed to flush temp file", e))?;
        Ok(Scratch {
            path,
            offsets,
            parents,
        })
    }

    /// Copy scratch lines into the main file, last line first.
    async fn reverse_pass(&self, channel_id: &str, scratch: &Scratch) -> Result<FileRef> {
        let mut out = self
            .sink
            .open_lines(&export_file_name(channel_id))
            .await
            .map_err(|e| Error::sink("failed to create export file", e))?;

        if !scratch.offsets.is_empty() {
            let source = File::open(&scratch.path)
                .await
                .map_err(|e| Error::io("failed to reopen temp file", e))?;
            let mut reader = BufReader::new(source);
            let mut line = Vec::new();

            for &offset in scratch.offsets.iter().rev() {
                if self.cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                reader
                    .seek(SeekFrom::Start(offset))
                    .await
                    .map_err(|e| Error::io("failed to seek temp file", e))?;
                line.clear();
                reader
                    .read_until(b'\n', &mut line)
                    .await
                    .map_err(|e| Error::io("failed to read temp file", e))?;
                if line.last() == Some(&b'\n') {
                    line.pop();
                }
                if line.is_empty() {
                    continue;
                }
                out.write_raw(&line)
                    .await
                    .map_err(|e| Error::sink("failed to write export file", e))?;
            }
        }

        out.finish()
            .await
            .map_err(|e| Error::sink("failed to write export file", e))
    }

    /// Write the parent and every reply of one thread to its own file.
    async fn write_thread(
        &self,
        channel_id: &str,
        parent: &Message,
        stats: &mut ExportStats,
        names: &mut AuthorNames,
    ) -> Result<FileRef> {
        let mut out = self
            .sink
            .open_lines(&thread_file_name(channel_id, &parent.ts))
            .await
            .map_err(|e| Error::sink("failed to write thread file", e))?;

        let parent_name = names.name_of(self.api, self.cancel, &parent.user).await?;
        let line = serde_json::to_vec(&ExportRecord::new(parent, None, parent_name))?;
        out.write_raw(&line)
            .await
            .map_err(|e| Error::sink("failed to write thread file", e))?;

        let api = self.api;
        let channel = channel_id.to_string();
        let parent_ts = parent.ts.clone();
        let limit = self.page_size;
        let mut pages = Paginator::new(self.cancel, "failed to get thread replies", move |cursor| {
            let params = RepliesParams {
                channel: channel.clone(),
                ts: parent_ts.clone(),
                limit,
                cursor,
            };
            async move { api.replies(&params).await }
        });

        while let Some(page) = pages.next_page().await? {
            for reply in page {
                if reply.ts == parent.ts {
                    continue;
                }
                stats.record(&reply);
                let user_name = names.name_of(self.api, self.cancel, &reply.user).await?;
                let line =
                    serde_json::to_vec(&ExportRecord::new(&reply, Some(&parent.ts), user_name))?;
                out.write_raw(&line)
                    .await
                    .map_err(|e| Error::sink("failed to write thread file", e))?;
            }
        }

        let file = out
            .finish()
            .await
            .map_err(|e| Error::sink("failed to write thread file", e))?;
        debug!(channel_id, parent_ts = %parent.ts, lines = file.lines, "Wrote thread file");
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use slackvault_traits::testing::{ScriptedSlack, message, reply, thread_parent};
    use tempfile::TempDir;

    use super::*;
    use crate::sink::DiskSink;

    fn read_records(file: &FileRef) -> Vec<ExportRecord> {
        std::fs::read_to_string(&file.path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn scratch_files(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("export-tmp-"))
            .count()
    }

    #[tokio::test]
    async fn reverses_pages_into_oldest_first() {
        let temp = TempDir::new().unwrap();
        let sink = DiskSink::new(temp.path());
        let messages = (0..7)
            .map(|i| message(&format!("{}", 100 + i), "U1", &format!("m{i}")))
            .collect();
        let slack = ScriptedSlack::new().with_history("C0000000001", messages);
        let cancel = CancellationToken::new();

        let outcome = ChannelExporter::new(&slack, &sink, &cancel)
            .with_page_size(3)
            .export(&ExportRequest::new("C0000000001"))
            .await
            .unwrap();

        let texts: Vec<_> = read_records(&outcome.file)
            .into_iter()
            .map(|r| r.text)
            .collect();
        assert_eq!(texts, vec!["m0", "m1", "m2", "m3", "m4", "m5", "m6"]);
        assert_eq!(outcome.file.lines, 7);
        assert_eq!(outcome.message_count, 7);
        assert_eq!(scratch_files(temp.path()), 0);
    }

    #[tokio::test]
    async fn threads_get_their_own_files() {
        let temp = TempDir::new().unwrap();
        let sink = DiskSink::new(temp.path());
        let slack = ScriptedSlack::new()
            .with_history(
                "C0000000001",
                vec![
                    thread_parent("100.000100", "U1", "question", 2),
                    message("101", "U2", "unrelated"),
                ],
            )
            .with_thread(
                "C0000000001",
                "100.000100",
                vec![
                    thread_parent("100.000100", "U1", "question", 2),
                    reply("100.000200", "100.000100", "U2", "answer"),
                    reply("100.000300", "100.000100", "U3", "thanks"),
                ],
            );
        let cancel = CancellationToken::new();

        let outcome = ChannelExporter::new(&slack, &sink, &cancel)
            .export(&ExportRequest::new("C0000000001"))
            .await
            .unwrap();

        assert_eq!(outcome.file.lines, 2);
        assert_eq!(outcome.thread_files.len(), 1);
        let thread = &outcome.thread_files[0];
        assert_eq!(thread.name, "export-C0000000001-thread-100.000100.jsonl");
        let records = read_records(thread);
        let texts: Vec<_> = records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["question", "answer", "thanks"]);
        assert!(records[0].thread_ts.is_none());
        assert_eq!(records[0].reply_count, 2);
        assert_eq!(
            records[1].thread_ts.as_deref(),
            Some("1970-01-01T00:01:40.000100Z")
        );

        assert_eq!(outcome.message_count, 4);
        assert_eq!(outcome.thread_count, 1);
        assert_eq!(outcome.unique_users, 3);
    }

    #[tokio::test]
    async fn empty_channel_yields_empty_file() {
        let temp = TempDir::new().unwrap();
        let sink = DiskSink::new(temp.path());
        let slack = ScriptedSlack::new().with_history("C0000000001", Vec::new());
        let cancel = CancellationToken::new();

        let outcome = ChannelExporter::new(&slack, &sink, &cancel)
            .export(&ExportRequest::new("C0000000001"))
            .await
            .unwrap();

        assert!(outcome.file.path.exists());
        assert_eq!(outcome.file.lines, 0);
        assert_eq!(outcome.file.bytes, 0);
        assert!(outcome.thread_files.is_empty());
        assert_eq!(scratch_files(temp.path()), 0);
    }

    #[tokio::test]
    async fn remote_failure_removes_scratch_file() {
        let temp = TempDir::new().unwrap();
        let sink = DiskSink::new(temp.path());
        let slack = ScriptedSlack::new();
        let cancel = CancellationToken::new();

        let err = ChannelExporter::new(&slack, &sink, &cancel)
            .export(&ExportRequest::new("C0000000404"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "failed to get history: slack api error: channel_not_found"
        );
        assert_eq!(scratch_files(temp.path()), 0);
    }
}
