use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    let msg = format!("{err:#}").to_lowercase();

    if msg.contains("slack_token is not set") || msg.contains("slack authentication error") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Provide fresh credentials with:");
        eprintln!(
            "  {} export SLACK_TOKEN=xoxc-... SLACK_COOKIE=xoxd-...",
            "$".dimmed()
        );
    }

    if msg.contains("channel not found") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Reload the channel directory or pass a channel ID:");
        eprintln!("  {} slackvault refresh", "$".dimmed());
        eprintln!("  {} slackvault channels --format json", "$".dimmed());
    }

    if msg.contains("connection refused") || msg.contains("network") || msg.contains("transport")
    {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check your internet connection and try again.");
    }

    std::process::exit(1);
}
