//! `tools` and `call`: talk to a running server.

use std::time::Duration;

use serde_json::Value;

use crate::cli::ConnectArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::socket::ToolClient;

fn client(config: &ClientConfig, connect: ConnectArgs) -> ClientResult<ToolClient> {
    let host = connect.host.unwrap_or_else(|| config.server.host.clone());
    let port = connect.port.unwrap_or(config.server.port);
    let api_key = config.server.api_key(connect.api_key)?;

    Ok(ToolClient::new(format!("{host}:{port}"), Duration::from_secs(connect.timeout))
        .with_api_key(api_key))
}

/// Prints the server's metadata and tools.
pub async fn tools(config: &ClientConfig, connect: ConnectArgs) -> ClientResult<()> {
    let client = client(config, connect)?;
    let info = client.describe().await?;
    println!("{} {} ({})", info.title, info.version, client.addr());

    for tool in client.list_tools().await? {
        println!();
        println!("{}  {}", tool.id, tool.name);
        println!("    {}", tool.description);
    }
    Ok(())
}

/// Calls a tool and prints its outcome as JSON.
///
/// A `failure` outcome is printed and then reported as an error, so the exit
/// status reflects it.
pub async fn call(
    config: &ClientConfig,
    connect: ConnectArgs,
    tool_id: &str,
    input: &str,
) -> ClientResult<()> {
    let input = parse_input(input)?;
    let client = client(config, connect)?;

    let outcome = client.call_tool(tool_id, input).await?;
    let rendered = serde_json::to_string_pretty(&outcome)
        .map_err(|e| ClientError::Protocol(format!("failed to serialize outcome: {e}")))?;
    println!("{rendered}");

    if outcome.is_success() {
        Ok(())
    } else {
        Err(ClientError::Protocol(format!(
            "tool `{tool_id}` reported failure"
        )))
    }
}

fn parse_input(input: &str) -> ClientResult<Value> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| ClientError::Config(format!("--input is not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(ClientError::Config("--input must be a JSON object".into()));
    }
    Ok(value)
}
