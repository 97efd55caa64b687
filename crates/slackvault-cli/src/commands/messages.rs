use anyhow::Result;
use comfy_table::{Cell, Table};
use slackvault_core::SlackService;
use slackvault_core::service::{
    GetPermalinkInput, MessageSummary, ReadHistoryInput, ReadThreadInput,
};
use tokio_util::sync::CancellationToken;

use crate::cli::{HistoryArgs, ThreadArgs};
use crate::commands::utils::{author, format_ts};
use crate::output::table::{print_table, truncate};
use crate::output::{OutputFormat, json::print_json};

const TEXT_WIDTH: usize = 80;

fn message_table(messages: &[MessageSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Time", "TS", "Author", "Replies", "Text"]);
    for message in messages {
        let replies = if message.reply_count > 0 {
            message.reply_count.to_string()
        } else {
            "-".to_string()
        };
        table.add_row(vec![
            Cell::new(format_ts(&message.timestamp)),
            Cell::new(&message.timestamp),
            Cell::new(author(&message.user, &message.user_name)),
            Cell::new(replies),
            Cell::new(truncate(&message.text, TEXT_WIDTH)),
        ]);
    }
    table
}

pub async fn history(
    service: &SlackService,
    args: HistoryArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let input = ReadHistoryInput {
        channel: args.channel,
        limit: args.limit,
        oldest: args.oldest,
        latest: args.latest,
    };
    let output = service.read_history(input, cancel).await?;

    if format.is_json() {
        return print_json(&output);
    }

    if output.messages.is_empty() {
        println!("No messages found.");
        return Ok(());
    }

    print_table(message_table(&output.messages))?;
    if output.has_more {
        println!("More messages available; raise --limit or narrow with --oldest/--latest.");
    }
    Ok(())
}

pub async fn thread(
    service: &SlackService,
    args: ThreadArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let input = ReadThreadInput {
        channel: args.channel,
        timestamp: args.timestamp,
        limit: args.limit,
    };
    let output = service.read_thread(input, cancel).await?;

    if format.is_json() {
        return print_json(&output);
    }

    println!("Thread {} in {}", output.thread_ts, output.channel_id);
    print_table(message_table(&output.messages))
}

pub async fn permalink(
    service: &SlackService,
    channel: String,
    timestamp: String,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let output = service
        .get_permalink(GetPermalinkInput { channel, timestamp }, cancel)
        .await?;

    if format.is_json() {
        return print_json(&output);
    }

    println!("{}", output.permalink);
    Ok(())
}
