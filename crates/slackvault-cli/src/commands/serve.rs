use anyhow::Result;
use slackvault_core::{SlackMcpServer, SlackService};
use tokio_util::sync::CancellationToken;

pub async fn run(service: SlackService, cancel: CancellationToken) -> Result<()> {
    let server = SlackMcpServer::with_cancel(service, cancel);
    server.run().await?;
    Ok(())
}
