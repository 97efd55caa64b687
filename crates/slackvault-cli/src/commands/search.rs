use anyhow::Result;
use comfy_table::{Cell, Table};
use slackvault_core::SlackService;
use slackvault_core::service::SearchMessagesInput;
use tokio_util::sync::CancellationToken;

use crate::cli::SearchArgs;
use crate::commands::utils::{author, format_ts};
use crate::output::table::{print_table, truncate};
use crate::output::{OutputFormat, json::print_json};

pub async fn run(
    service: &SlackService,
    args: SearchArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let input = SearchMessagesInput {
        query: args.query,
        count: args.count,
        sort: args.sort,
    };
    let output = service.search_messages(input, cancel).await?;

    if format.is_json() {
        return print_json(&output);
    }

    if output.matches.is_empty() {
        println!("No matches for {:?}.", output.query);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Time", "Channel", "Author", "Text", "Link"]);
    for found in &output.matches {
        table.add_row(vec![
            Cell::new(format_ts(&found.timestamp)),
            Cell::new(format!("#{}", found.channel)),
            Cell::new(author(&found.user, &found.user_name)),
            Cell::new(truncate(&found.text, 60)),
            Cell::new(&found.permalink),
        ]);
    }
    print_table(table)?;
    println!("Showing {} of {} matches.", output.matches.len(), output.total);
    Ok(())
}
