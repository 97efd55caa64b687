//! slackvault traits - shared data model and capability interfaces.
//!
//! This crate provides the seams the rest of the workspace is built on:
//! - The remote capability set (`SlackApi`) and its request/page types
//! - The output sink capability (`ArtifactSink`, `LineWriter`, `FileRef`)
//! - Remote and sink error types
//! - A scripted in-memory `SlackApi` double behind the `test-utils` feature

pub mod api;
pub mod error;
pub mod model;
pub mod sink;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// ── Top-level re-exports ─────────────────────────────────────────────

pub use api::{HistoryParams, ListChannelsParams, RepliesParams, SearchParams, SearchSort, SlackApi};
pub use error::{Result, SinkError, SinkResult, SlackError};
pub use model::{
    CanvasRef, Channel, ChannelProperties, ChannelText, Cursor, FileInfo, Message, Page,
    Reaction, SearchChannel, SearchMatch, SearchResults, User, UserProfile,
};
pub use sink::{ArtifactSink, FileRef, LineWriter};
