//! Serve command: runs the tool server in the foreground.

use std::sync::Arc;

use tracing::{info, warn};

use latestdoc_protocol::ServiceInfo;
use latestdoc_server::{
    LatestDocumentTool, RequestHandler, SignalHandler, TcpServer, ToolRegistry,
    make_connection_handler,
};

use crate::cli::GoogleArgs;
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Listener overrides from the command line.
#[derive(Debug, Default)]
pub struct ServeOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub api_key: Option<String>,
}

/// Starts the server and blocks until SIGINT/SIGTERM or a `shutdown` request.
pub async fn run(config: &ClientConfig, args: &GoogleArgs, options: ServeOptions) -> ClientResult<()> {
    let server_config =
        config
            .server
            .to_server_config(options.host, options.port, options.api_key)?;
    if server_config.api_key.is_none() {
        warn!("No API key configured; any local caller can invoke tools");
    }

    let manager = super::credential_manager(config, args, config.google.consent.prompt())?;
    let credentials_file = manager.config().credentials_file.clone();
    if !credentials_file.exists() {
        warn!(
            path = %credentials_file.display(),
            "Credential file not found; tool calls will fail until it exists"
        );
    }

    let registry = ToolRegistry::new().with_tool(LatestDocumentTool::google(Arc::new(manager)));
    info!(tools = registry.len(), "Tools registered");

    let signal_handler = SignalHandler::new();
    signal_handler.spawn_listener();

    let api_key = server_config.api_key.clone();
    let handler = RequestHandler::new(
        ServiceInfo::google_drive(env!("CARGO_PKG_VERSION")),
        registry,
        signal_handler.shutdown_handle(),
    )
    .with_api_key(api_key);

    let server = TcpServer::bind(server_config).await?;
    println!("latestdoc listening on {}", server.local_addr());

    server
        .run_until_shutdown(
            make_connection_handler(Arc::new(handler)),
            signal_handler.shutdown().wait(),
        )
        .await?;

    info!("Server stopped");
    Ok(())
}
