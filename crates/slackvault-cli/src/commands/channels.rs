use anyhow::Result;
use comfy_table::{Cell, Table};
use slackvault_core::SlackService;
use slackvault_core::service::ListChannelsInput;
use tokio_util::sync::CancellationToken;

use crate::cli::ChannelsArgs;
use crate::output::table::{file_table, print_table};
use crate::output::{OutputFormat, json::print_json};

pub async fn list(
    service: &SlackService,
    args: ChannelsArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let input = ListChannelsInput {
        types: args.types,
        limit: args.limit,
        cursor: args.cursor,
    };
    let output = service.list_channels(input, cancel).await?;

    if format.is_json() {
        return print_json(&output);
    }

    println!("Channels: {}", output.total_count);
    if let (Some(first), Some(last)) = (&output.first_channel, &output.last_channel) {
        let mut table = Table::new();
        table.set_header(vec!["", "ID", "Name", "Members", "Private"]);
        for (label, channel) in [("first", first), ("last", last)] {
            table.add_row(vec![
                Cell::new(label),
                Cell::new(&channel.id),
                Cell::new(format!("#{}", channel.name)),
                Cell::new(channel.member_count),
                Cell::new(if channel.is_private { "yes" } else { "no" }),
            ]);
        }
        print_table(table)?;
    }
    print_table(file_table([&output.file]))?;
    if !output.next_cursor.is_empty() {
        println!("Next page: --cursor {}", output.next_cursor);
    }
    Ok(())
}

pub async fn refresh(
    service: &SlackService,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let output = service.refresh_channels(cancel).await?;

    if format.is_json() {
        return print_json(&output);
    }

    println!("Loaded {} channels ({} known).", output.fetched, output.known);
    Ok(())
}
