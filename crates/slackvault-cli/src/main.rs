mod cli;
mod commands;
mod completions;
mod config;
mod error;
mod output;
mod setup;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::{CliConfig, Settings};
use slackvault_core::paths;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        completions::generate_completions(*shell);
        return;
    }

    let serving = matches!(cli.command, Commands::Serve);
    if let Err(err) = run(cli).await {
        error::handle_error(err);
    }
    if serving {
        // The stdin reader thread cannot be interrupted, so runtime shutdown
        // would block until the next input line.
        std::process::exit(0);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = CliConfig::load();
    let settings = Settings::resolve(&cli, &config)?;
    let _guard = init_logging(&settings)?;

    let service = setup::prepare_service(&settings).await?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            interrupt.cancel();
        }
    });

    setup::ensure_directory(&service, cli.command.channel_ref(), &cancel).await?;
    commands::run(service, cli.command, cli.format, cancel).await
}

/// Log to stderr and to a daily file under `<work_dir>/logs`. Stdout is
/// reserved for command output and the MCP transport.
fn init_logging(settings: &Settings) -> Result<WorkerGuard> {
    let log_dir = paths::logs_dir(&settings.work_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "slackvault.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false)
                .with_level(true),
        )
        .init();

    Ok(guard)
}
