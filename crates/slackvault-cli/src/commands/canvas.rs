use anyhow::Result;
use slackvault_core::SlackService;
use slackvault_core::service::ReadCanvasInput;
use tokio_util::sync::CancellationToken;

use crate::cli::CanvasArgs;
use crate::output::table::{file_table, print_table};
use crate::output::{OutputFormat, json::print_json};

pub async fn run(
    service: &SlackService,
    args: CanvasArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let input = ReadCanvasInput {
        channel: args.channel,
        file_id: args.file_id,
    };
    let output = service.read_canvas(input, cancel).await?;

    if format.is_json() {
        return print_json(&output);
    }

    println!("Canvas: {} ({})", output.title, output.file_id);
    print_table(file_table([&output.file]))
}
