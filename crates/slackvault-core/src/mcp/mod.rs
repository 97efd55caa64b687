//! MCP (Model Context Protocol) server for slackvault
//!
//! Exposes the read and export operations as `slack_*` tools over stdio so
//! MCP-compatible assistants can browse and archive a workspace.

pub mod server;

pub use server::SlackMcpServer;
