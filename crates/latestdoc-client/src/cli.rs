//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use latestdoc_providers::OrderBy;

/// Tool server to surface the newest Google Doc from Google Drive
#[derive(Debug, Parser)]
#[command(name = "latestdoc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "LATESTDOC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(flatten)]
    pub google: GoogleArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the `[google]` section.
#[derive(Debug, Clone, Default, Args)]
pub struct GoogleArgs {
    /// Path to the OAuth client or service-account JSON file
    #[arg(long, global = true, env = "LATESTDOC_CREDENTIALS_FILE")]
    pub credentials_file: Option<PathBuf>,

    /// Path of the persisted token file
    #[arg(long, global = true, env = "LATESTDOC_TOKEN_PATH")]
    pub token_path: Option<PathBuf>,

    /// Which timestamp picks the latest document (created_time, modified_time)
    #[arg(long, global = true)]
    pub order_by: Option<OrderBy>,
}

/// Where to reach a running tool server.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectArgs {
    /// Server host
    #[arg(long)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short)]
    pub port: Option<u16>,

    /// API key sent with every request
    #[arg(long, env = "LATESTDOC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "60")]
    pub timeout: u64,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the tool server in the foreground
    Serve {
        /// Listen host
        #[arg(long)]
        host: Option<String>,

        /// Listen port
        #[arg(long, short)]
        port: Option<u16>,

        /// API key required from callers
        #[arg(long, env = "LATESTDOC_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Emit logs as JSON lines
        #[arg(long)]
        json_logs: bool,
    },

    /// Run the consent flow and persist a token
    Auth {
        /// Discard the stored token and authorize again
        #[arg(long, short)]
        force: bool,
    },

    /// Fetch the latest document once and print it
    Fetch {
        /// Print `{id, title, content}` as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the tools of a running server
    Tools {
        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// Call a tool on a running server
    Call {
        /// Tool id
        #[arg(default_value = "get-latest-document")]
        tool_id: String,

        /// Tool input as a JSON object
        #[arg(long, default_value = "{}")]
        input: String,

        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
