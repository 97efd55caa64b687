pub mod canvas;
pub mod channels;
pub mod export;
pub mod messages;
pub mod search;
pub mod serve;
pub mod user;
pub mod utils;

use anyhow::Result;
use slackvault_core::SlackService;
use tokio_util::sync::CancellationToken;

use crate::cli::Commands;
use crate::output::OutputFormat;

/// Run a one-shot command against `service`.
pub async fn run(
    service: SlackService,
    command: Commands,
    format: OutputFormat,
    cancel: CancellationToken,
) -> Result<()> {
    match command {
        Commands::Serve => serve::run(service, cancel).await,
        Commands::Channels(args) => channels::list(&service, args, format, &cancel).await,
        Commands::Refresh => channels::refresh(&service, format, &cancel).await,
        Commands::History(args) => messages::history(&service, args, format, &cancel).await,
        Commands::Thread(args) => messages::thread(&service, args, format, &cancel).await,
        Commands::Permalink { channel, timestamp } => {
            messages::permalink(&service, channel, timestamp, format, &cancel).await
        }
        Commands::Search(args) => search::run(&service, args, format, &cancel).await,
        Commands::User(args) => user::run(&service, args, format, &cancel).await,
        Commands::Canvas(args) => canvas::run(&service, args, format, &cancel).await,
        Commands::Export(args) => export::run(&service, args, format, &cancel).await,
        Commands::Completions { .. } => Ok(()),
    }
}
