use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use verdict_core::DEFAULT_MAX_COMMENTS;

use super::logging::LogDestination;

#[derive(Parser, Debug)]
#[command(name = "verdict", version, about = "Analyze Reddit threads and chat about them")]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogDestination::File, global = true)]
    pub log_to: LogDestination,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags that take precedence over `verdict.ron`.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Config file; defaults to ./verdict.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend root, e.g. http://localhost:8000/api/v1
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Bearer token sent with every request.
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[arg(long, global = true)]
    pub poll_interval_secs: Option<u64>,

    /// Report an unreachable backend instead of serving demo data.
    #[arg(long, global = true)]
    pub no_fallback: bool,

    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit a thread for analysis and wait for the result.
    Analyze {
        url: String,
        #[arg(long, default_value_t = DEFAULT_MAX_COMMENTS)]
        max_comments: u32,
    },
    /// List analyzed conversations.
    Conversations,
    /// Send one message to a conversation and print the thread.
    Chat { conversation_id: String, text: String },
}
