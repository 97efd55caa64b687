//! Disk-backed artifact sink.
//!
//! Structured results land as timestamped files in one directory; streaming
//! line writers create exactly the name they are given.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use slackvault_traits::{ArtifactSink, FileRef, LineWriter, SinkResult};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

/// Nanoseconds since the epoch, used to make generated file names unique.
pub(crate) fn unix_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

/// Writes artifacts into a single directory.
#[derive(Debug, Clone)]
pub struct DiskSink {
    dir: PathBuf,
}

impl DiskSink {
    /// Use `dir` as-is. The directory must already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create `dir` (and parents) if needed, then use it.
    pub async fn create(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    async fn write_file(&self, file_name: String, content: &[u8]) -> SinkResult<FileRef> {
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, content).await?;
        debug!(file = %path.display(), bytes = content.len(), "Wrote artifact");
        Ok(FileRef {
            path,
            name: file_name,
            bytes: content.len() as u64,
            lines: content.iter().filter(|b| **b == b'\n').count() + 1,
        })
    }
}

#[async_trait]
impl ArtifactSink for DiskSink {
    fn dir(&self) -> &Path {
        &self.dir
    }

    async fn write_json(&self, name: &str, data: &Value) -> SinkResult<FileRef> {
        let content = serde_json::to_vec_pretty(data)?;
        self.write_file(format!("{}-{}.json", name, unix_nanos()), &content)
            .await
    }

    async fn write_text(&self, name: &str, text: &str) -> SinkResult<FileRef> {
        self.write_file(format!("{}-{}.txt", name, unix_nanos()), text.as_bytes())
            .await
    }

    async fn open_lines(&self, file_name: &str) -> SinkResult<Box<dyn LineWriter>> {
        let path = self.dir.join(file_name);
        let file = File::create(&path).await?;
        Ok(Box::new(DiskLineWriter {
            path,
            name: file_name.to_string(),
            writer: BufWriter::new(file),
            bytes: 0,
            lines: 0,
        }))
    }
}

/// Buffered JSON-lines writer over one file.
pub struct DiskLineWriter {
    path: PathBuf,
    name: String,
    writer: BufWriter<File>,
    bytes: u64,
    lines: usize,
}

#[async_trait]
impl LineWriter for DiskLineWriter {
    async fn write_raw(&mut self, line: &[u8]) -> SinkResult<()> {
        self.writer.write_all(line).await?;
        self.writer.write_all(b"\n").await?;
        self.bytes += line.len() as u64 + 1;
        self.lines += 1;
        Ok(())
    }

    fn lines_written(&self) -> usize {
        self.lines
    }

    async fn finish(self: Box<Self>) -> SinkResult<FileRef> {
        let mut this = *self;
        this.writer.flush().await?;
        this.writer.get_mut().sync_all().await?;
        debug!(file = %this.path.display(), lines = this.lines, "Closed line writer");
        Ok(FileRef {
            path: this.path,
            name: this.name,
            bytes: this.bytes,
            lines: this.lines,
        })
    }
}
