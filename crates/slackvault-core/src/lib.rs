pub mod authors;
pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod export;
pub mod html;
pub mod mcp;
pub mod paginate;
pub mod paths;
pub mod retry;
pub mod service;
pub mod sink;

pub use client::SlackHttpClient;
pub use config::SlackConfig;
pub use directory::{ChannelDirectory, is_channel_id};
pub use error::{Error, Result};
pub use export::{ChannelExporter, ExportOutcome, ExportRequest};
pub use mcp::SlackMcpServer;
pub use service::SlackService;
pub use sink::DiskSink;
