//! latestdoc CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use latestdoc_client::cli::{Cli, Command, ConfigAction};
use latestdoc_client::commands;
use latestdoc_client::commands::serve::ServeOptions;
use latestdoc_client::config::ClientConfig;
use latestdoc_client::error::ClientResult;
use latestdoc_core::{TracingConfig, TracingOutputFormat, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = match &cli.command {
        Command::Serve { json_logs, .. } => {
            let config = TracingConfig::server();
            let config = if cli.debug {
                config.with_level(Level::DEBUG)
            } else {
                config
            };
            if *json_logs {
                config.with_format(TracingOutputFormat::Json)
            } else {
                config
            }
        }
        _ => TracingConfig::cli(cli.debug),
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = ClientConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve {
            host,
            port,
            api_key,
            json_logs: _,
        } => {
            let options = ServeOptions {
                host,
                port,
                api_key,
            };
            commands::serve::run(&config, &cli.google, options).await
        }
        Command::Auth { force } => commands::auth::run(&config, &cli.google, force).await,
        Command::Fetch { json } => commands::fetch::run(&config, &cli.google, json).await,
        Command::Tools { connect } => commands::remote::tools(&config, connect).await,
        Command::Call {
            tool_id,
            input,
            connect,
        } => commands::remote::call(&config, connect, &tool_id, &input).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config, &cli.google),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}
