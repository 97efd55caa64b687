use anyhow::Result;
use colored::Colorize;
use slackvault_core::SlackService;
use slackvault_core::service::ExportChannelInput;
use tokio_util::sync::CancellationToken;

use crate::cli::ExportArgs;
use crate::output::table::{file_table, print_table};
use crate::output::{OutputFormat, json::print_json};

pub async fn run(
    service: &SlackService,
    args: ExportArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let input = ExportChannelInput {
        channel: args.channel,
        oldest: args.oldest,
        latest: args.latest,
    };
    let outcome = service.export_channel(input, cancel).await?;

    if format.is_json() {
        return print_json(&outcome);
    }

    println!("{} {}", "Exported".green().bold(), outcome.channel_id);
    println!("Messages:     {}", outcome.message_count);
    println!("Threads:      {}", outcome.thread_count);
    println!("Reactions:    {}", outcome.reaction_count);
    println!("Authors:      {}", outcome.unique_users);
    print_table(file_table(
        std::iter::once(&outcome.file).chain(outcome.thread_files.iter()),
    ))
}
