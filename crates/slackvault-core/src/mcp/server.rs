//! MCP server implementation for slackvault

use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::tool::schema_for_type,
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
    },
    service::{RequestContext, RoleServer, RunningServiceCancellationToken},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, stdin, stdout};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::service::{
    ExportChannelInput, GetPermalinkInput, GetUserInput, ListChannelsInput, ReadCanvasInput,
    ReadHistoryInput, ReadThreadInput, RefreshChannelsInput, SearchMessagesInput, SlackService,
};

/// slackvault MCP Server
///
/// Every tool call runs under a child of the server's root cancellation token.
#[derive(Clone)]
pub struct SlackMcpServer {
    service: SlackService,
    cancel: CancellationToken,
}

impl SlackMcpServer {
    pub fn new(service: SlackService) -> Self {
        Self::with_cancel(service, CancellationToken::new())
    }

    pub fn with_cancel(service: SlackService, cancel: CancellationToken) -> Self {
        Self { service, cancel }
    }

    pub fn service(&self) -> &SlackService {
        &self.service
    }

    /// Tool descriptors published by `list_tools`.
    pub fn tools() -> Vec<Tool> {
        vec![
            Tool::new(
                "slack_list_channels",
                "List Slack channels. Writes the page to a JSON file and returns its path, the channel count, the first and last channel, and a cursor for the next page.",
                schema_for_type::<ListChannelsInput>(),
            ),
            Tool::new(
                "slack_refresh_channels",
                "Reload the channel name directory from the full channel listing. Use when a channel name is reported as not found.",
                schema_for_type::<RefreshChannelsInput>(),
            ),
            Tool::new(
                "slack_read_history",
                "Read recent messages from a channel, newest first. Accepts a channel ID or name.",
                schema_for_type::<ReadHistoryInput>(),
            ),
            Tool::new(
                "slack_read_thread",
                "Read every message in a thread, parent first.",
                schema_for_type::<ReadThreadInput>(),
            ),
            Tool::new(
                "slack_search_messages",
                "Search messages across the workspace. Returns matches with permalinks.",
                schema_for_type::<SearchMessagesInput>(),
            ),
            Tool::new(
                "slack_get_user",
                "Get a user's profile by user ID or by email. Provide exactly one.",
                schema_for_type::<GetUserInput>(),
            ),
            Tool::new(
                "slack_get_permalink",
                "Get the permalink URL of a message.",
                schema_for_type::<GetPermalinkInput>(),
            ),
            Tool::new(
                "slack_read_canvas",
                "Read a canvas as plain text, either the canvas attached to a channel or a standalone canvas by file ID. The text is written to a file.",
                schema_for_type::<ReadCanvasInput>(),
            ),
            Tool::new(
                "slack_export_channel",
                "Export a channel's full history to a JSON Lines file in chronological order, with one additional file per thread.",
                schema_for_type::<ExportChannelInput>(),
            ),
        ]
    }

    /// Run one tool. The outer error is a protocol error (unknown tool or bad
    /// arguments); the inner one is a failed operation reported to the caller.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<Result<String, String>, McpError> {
        let cancel = self.cancel.child_token();
        let service = &self.service;
        debug!(tool = name, "Tool call");

        let result = match name {
            "slack_list_channels" => {
                render(service.list_channels(parse_args(arguments)?, &cancel).await)
            }
            "slack_refresh_channels" => {
                let _: RefreshChannelsInput = parse_args(arguments)?;
                render(service.refresh_channels(&cancel).await)
            }
            "slack_read_history" => {
                render(service.read_history(parse_args(arguments)?, &cancel).await)
            }
            "slack_read_thread" => {
                render(service.read_thread(parse_args(arguments)?, &cancel).await)
            }
            "slack_search_messages" => {
                render(service.search_messages(parse_args(arguments)?, &cancel).await)
            }
            "slack_get_user" => render(service.get_user(parse_args(arguments)?, &cancel).await),
            "slack_get_permalink" => {
                render(service.get_permalink(parse_args(arguments)?, &cancel).await)
            }
            "slack_read_canvas" => {
                render(service.read_canvas(parse_args(arguments)?, &cancel).await)
            }
            "slack_export_channel" => {
                render(service.export_channel(parse_args(arguments)?, &cancel).await)
            }
            other => {
                return Err(McpError::invalid_params(
                    format!("Unknown tool: {}", other),
                    None,
                ));
            }
        };

        if let Err(error) = &result {
            warn!(tool = name, error = %error, "Tool call failed");
        }
        Ok(result)
    }

    /// Populate the channel directory in the background. Failures are logged.
    pub fn spawn_directory_refresh(&self) -> JoinHandle<()> {
        let service = self.service.clone();
        let cancel = self.cancel.child_token();
        tokio::spawn(async move {
            match service.refresh_channels(&cancel).await {
                Ok(refreshed) => info!(channels = refreshed.known, "Channel directory populated"),
                Err(e) if e.is_cancelled() => debug!("Channel directory population cancelled"),
                Err(e) => warn!(error = %e, "Channel directory population failed"),
            }
        })
    }

    /// Run the MCP server using stdio transport
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_on(stdio()).await
    }

    /// Serve over a byte transport until the peer disconnects or the root
    /// cancellation token fires.
    pub async fn run_on<R, W>(self, transport: (R, W)) -> anyhow::Result<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        info!("Starting slackvault MCP server...");
        let cancel = self.cancel.clone();
        self.spawn_directory_refresh();
        let server = self.serve(transport).await?;
        info!("MCP server initialized, waiting for requests...");

        let shutdown = tokio::spawn(close_on_cancel(cancel.clone(), server.cancellation_token()));
        let reason = server.waiting().await;
        shutdown.abort();
        cancel.cancel();
        let reason = reason?;
        info!(?reason, "MCP server stopped");
        Ok(())
    }
}

/// Close the running service once `cancel` fires.
async fn close_on_cancel(cancel: CancellationToken, service: RunningServiceCancellationToken) {
    cancel.cancelled().await;
    info!("Shutdown requested, closing MCP server");
    service.cancel();
}

/// Create stdio transport for MCP communication
fn stdio() -> (tokio::io::Stdin, tokio::io::Stdout) {
    (stdin(), stdout())
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, McpError> {
    serde_json::from_value(arguments)
        .map_err(|e| McpError::invalid_params(format!("Invalid parameters: {}", e), None))
}

fn render<T: Serialize>(result: crate::Result<T>) -> Result<String, String> {
    let output = result.map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&output).map_err(|e| format!("Failed to serialize result: {}", e))
}

impl ServerHandler for SlackMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "slackvault".to_string(),
                title: Some("slackvault MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "slackvault MCP Server - Read and archive a Slack workspace. \
                Use slack_list_channels/slack_refresh_channels to discover channels, \
                slack_read_history/slack_read_thread to read conversations, \
                slack_search_messages and slack_get_user for lookups, \
                slack_read_canvas for canvases, and slack_export_channel for full chronological exports."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            meta: None,
            tools: Self::tools(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = Value::Object(request.arguments.unwrap_or_default());
        match self.dispatch(request.name.as_ref(), arguments).await? {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(error) => Ok(CallToolResult::error(vec![Content::text(error)])),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use std::time::Duration;

    use serde_json::json;
    use slackvault_traits::testing::{ScriptedSlack, channel, message};
    use slackvault_traits::{SlackApi, User};
    use tempfile::TempDir;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    use super::*;
    use crate::sink::DiskSink;

    fn create_test_server(slack: ScriptedSlack) -> (SlackMcpServer, TempDir) {
        create_shared_test_server(Arc::new(slack))
    }

    fn create_shared_test_server(slack: Arc<ScriptedSlack>) -> (SlackMcpServer, TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let api: Arc<dyn SlackApi> = slack;
        let service = SlackService::new(api, Arc::new(DiskSink::new(temp_dir.path())));
        (SlackMcpServer::new(service), temp_dir)
    }

    #[test]
    fn test_every_tool_is_published() {
        let names: Vec<String> = SlackMcpServer::tools()
            .iter()
            .map(|tool| tool.name.to_string())
            .collect();
        assert_eq!(names.len(), 9);
        assert!(names.iter().all(|name| name.starts_with("slack_")));
        assert!(names.contains(&"slack_export_channel".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_protocol_error() {
        let (server, _temp_dir) = create_test_server(ScriptedSlack::new());
        let result = server.dispatch("slack_delete_everything", json!({})).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_invalid_params() {
        let (server, _temp_dir) = create_test_server(ScriptedSlack::new());
        let result = server
            .dispatch("slack_read_history", json!({"limit": 5}))
            .await;
        let error = result.unwrap_err();
        assert!(error.message.contains("Invalid parameters"));
    }

    #[tokio::test]
    async fn test_operation_failure_is_tool_error() {
        let (server, _temp_dir) = create_test_server(ScriptedSlack::new());
        let result = server.dispatch("slack_get_user", json!({})).await.unwrap();
        assert!(
            result
                .unwrap_err()
                .contains("either user ID or email is required")
        );
    }

    #[tokio::test]
    async fn test_success_returns_pretty_json() {
        let slack = ScriptedSlack::new().with_user(User::new("U1", "alice"));
        let (server, _temp_dir) = create_test_server(slack);

        let text = server
            .dispatch("slack_get_user", json!({"user": "U1"}))
            .await
            .unwrap()
            .unwrap();

        assert!(text.contains('\n'));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["user"]["name"], "alice");
    }

    #[tokio::test]
    async fn test_background_refresh_populates_directory() {
        let slack = ScriptedSlack::new()
            .with_channels(vec![channel("C0000000001", "general")])
            .with_history("C0000000001", vec![message("100.000001", "U1", "hi")]);
        let (server, _temp_dir) = create_test_server(slack);

        server.spawn_directory_refresh().await.unwrap();

        assert_eq!(server.service().directory().len(), 1);
        let text = server
            .dispatch("slack_read_history", json!({"channel": "#general"}))
            .await
            .unwrap()
            .unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["channel_id"], "C0000000001");
        assert_eq!(parsed["messages"][0]["text"], "hi");
    }

    #[tokio::test]
    async fn test_history_through_dispatch_names_authors() {
        let slack = Arc::new(
            ScriptedSlack::new()
                .with_user(User::new("U1", "alice"))
                .with_user(User::new("U2", "bob"))
                .with_history(
                    "C0000000001",
                    vec![
                        message("102.000001", "U1", "third"),
                        message("101.000001", "U2", "second"),
                        message("100.000001", "U1", "first"),
                    ],
                ),
        );
        let (server, _temp_dir) = create_shared_test_server(slack.clone());

        let text = server
            .dispatch("slack_read_history", json!({"channel": "C0000000001"}))
            .await
            .unwrap()
            .unwrap();

        let parsed: Value = serde_json::from_str(&text).unwrap();
        let names: Vec<&str> = parsed["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["user_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["alice", "bob", "alice"]);
        assert_eq!(slack.calls(slackvault_traits::api::method::USER_INFO), 2);
    }

    #[tokio::test]
    async fn test_cancellation_stops_connected_server() {
        let (server, _temp_dir) = create_test_server(ScriptedSlack::new());
        let cancel = server.cancel.clone();
        let (client, server_io) = tokio::io::duplex(64 * 1024);
        let running = tokio::spawn(server.run_on(tokio::io::split(server_io)));

        let (client_read, mut client_write) = tokio::io::split(client);
        let mut client_read = BufReader::new(client_read);
        client_write
            .write_all(
                concat!(
                    r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":"#,
                    r#"{"protocolVersion":"2024-11-05","capabilities":{},"#,
                    r#""clientInfo":{"name":"test-client","version":"0.0.1"}}}"#,
                    "\n"
                )
                .as_bytes(),
            )
            .await
            .unwrap();
        let mut response = String::new();
        client_read.read_line(&mut response).await.unwrap();
        assert!(response.contains("slackvault"));
        client_write
            .write_all(b"{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n")
            .await
            .unwrap();

        // The client stays connected; only the token ends the session.
        cancel.cancel();
        let outcome = tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .expect("server did not stop after cancellation")
            .unwrap();
        assert!(outcome.is_ok());
        drop(client_write);
    }

    #[tokio::test]
    async fn test_failed_background_refresh_is_not_fatal() {
        let slack = ScriptedSlack::new();
        slack.fail_next(
            slackvault_traits::api::method::LIST_CHANNELS,
            slackvault_traits::SlackError::api("internal_error"),
        );
        let (server, _temp_dir) = create_test_server(slack);

        server.spawn_directory_refresh().await.unwrap();

        assert!(server.service().directory().is_empty());
    }
}
