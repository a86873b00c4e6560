//! Configuration commands.

use std::path::Path;

use latestdoc_providers::google::Credential;

use crate::cli::GoogleArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the effective configuration to stdout.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);
    Ok(())
}

/// Validate the configuration and the credential file it points at.
pub fn validate(config: &ClientConfig, args: &GoogleArgs) -> ClientResult<()> {
    let google = config.google.to_provider_config(args)?;
    config.server.to_server_config(None, None, None)?;

    let credential = Credential::from_file(&google.credentials_file)?;
    println!(
        "Credential file {} is a valid {} credential.",
        google.credentials_file.display(),
        credential.kind()
    );

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}
