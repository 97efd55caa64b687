//! Output sink abstraction.
//!
//! Operations hand structured results to a sink and get a [`FileRef`] back;
//! the sink decides where and how bytes land.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SinkResult;

/// Reference to a written artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub path: PathBuf,
    pub name: String,
    pub bytes: u64,
    pub lines: usize,
}

/// Destination for operation artifacts.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Storage directory. Callers may create private scratch files here.
    fn dir(&self) -> &Path;

    /// Write one structured document under a generated, unique file name.
    async fn write_json(&self, name: &str, data: &Value) -> SinkResult<FileRef>;

    /// Write plain text under a generated, unique file name.
    async fn write_text(&self, name: &str, text: &str) -> SinkResult<FileRef>;

    /// Open a streaming line writer that creates exactly `file_name`.
    async fn open_lines(&self, file_name: &str) -> SinkResult<Box<dyn LineWriter>>;
}

/// Streaming writer for line-delimited records.
#[async_trait]
pub trait LineWriter: Send {
    /// Append one pre-serialized line. The newline is added by the writer.
    async fn write_raw(&mut self, line: &[u8]) -> SinkResult<()>;

    /// Serialize and append one record.
    async fn write_record(&mut self, record: &Value) -> SinkResult<()> {
        let line = serde_json::to_vec(record)?;
        self.write_raw(&line).await
    }

    fn lines_written(&self) -> usize;

    /// Flush and close, reporting final byte and line counts.
    async fn finish(self: Box<Self>) -> SinkResult<FileRef>;
}
