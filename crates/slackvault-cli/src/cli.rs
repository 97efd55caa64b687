use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "slackvault")]
#[command(version, about = "slackvault - Read, search and archive Slack workspaces")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Slack token (xoxb-, xoxp- or xoxc-)
    #[arg(long, global = true, env = "SLACK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Value of the `d` cookie, required with xoxc- tokens
    #[arg(long, global = true, env = "SLACK_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Working directory for responses and logs (defaults to ~/.slackvault)
    #[arg(long, global = true, env = "SLACKVAULT_DIR")]
    pub work_dir: Option<String>,

    /// Log level filter (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server on stdio
    Serve,

    /// List one page of channels
    Channels(ChannelsArgs),

    /// Reload the channel name directory
    Refresh,

    /// Read recent channel messages
    History(HistoryArgs),

    /// Read a whole thread
    Thread(ThreadArgs),

    /// Search messages
    Search(SearchArgs),

    /// Look up a user by ID or email
    User(UserArgs),

    /// Get a message permalink
    Permalink {
        /// Channel ID or name
        channel: String,
        /// Message timestamp
        timestamp: String,
    },

    /// Read a canvas as plain text
    Canvas(CanvasArgs),

    /// Export a channel to JSON Lines, oldest message first
    Export(ExportArgs),

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Commands {
    /// Channel reference the command will resolve, if any.
    pub fn channel_ref(&self) -> Option<&str> {
        match self {
            Commands::History(args) => Some(&args.channel),
            Commands::Thread(args) => Some(&args.channel),
            Commands::Permalink { channel, .. } => Some(channel),
            Commands::Canvas(args) => args.channel.as_deref(),
            Commands::Export(args) => Some(&args.channel),
            _ => None,
        }
    }
}

#[derive(Args)]
pub struct ChannelsArgs {
    /// Channel types, comma-separated (public_channel, private_channel, mpim, im)
    #[arg(long)]
    pub types: Option<String>,

    /// Channels per page (1-1000)
    #[arg(long)]
    pub limit: Option<u32>,

    /// Cursor from a previous page
    #[arg(long)]
    pub cursor: Option<String>,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Channel ID or name
    pub channel: String,

    /// Number of messages (1-100)
    #[arg(long)]
    pub limit: Option<u32>,

    /// Only messages after this timestamp
    #[arg(long)]
    pub oldest: Option<String>,

    /// Only messages before this timestamp
    #[arg(long)]
    pub latest: Option<String>,
}

#[derive(Args)]
pub struct ThreadArgs {
    /// Channel ID or name
    pub channel: String,

    /// Parent message timestamp
    pub timestamp: String,

    /// Replies per page (1-1000)
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Number of results (1-100)
    #[arg(long)]
    pub count: Option<u32>,

    /// Sort by score or timestamp
    #[arg(long, value_parser = ["score", "timestamp"])]
    pub sort: Option<String>,
}

#[derive(Args)]
pub struct UserArgs {
    /// User ID
    #[arg(long, conflicts_with = "email")]
    pub id: Option<String>,

    /// User email address
    #[arg(long)]
    pub email: Option<String>,
}

#[derive(Args)]
pub struct CanvasArgs {
    /// Channel ID or name whose canvas to read
    #[arg(long, conflicts_with = "file_id")]
    pub channel: Option<String>,

    /// Canvas file ID
    #[arg(long)]
    pub file_id: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Channel ID or name
    pub channel: String,

    /// Only messages after this timestamp
    #[arg(long)]
    pub oldest: Option<String>,

    /// Only messages before this timestamp
    #[arg(long)]
    pub latest: Option<String>,
}
