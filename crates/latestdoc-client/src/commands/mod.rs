//! Subcommand implementations.

pub mod auth;
pub mod config;
pub mod fetch;
pub mod remote;
pub mod serve;

use std::sync::Arc;

use latestdoc_providers::google::{ConsentPrompt, CredentialManager};

use crate::cli::GoogleArgs;
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Builds a credential manager from config and CLI overrides.
pub(crate) fn credential_manager(
    config: &ClientConfig,
    args: &GoogleArgs,
    prompt: Arc<dyn ConsentPrompt>,
) -> ClientResult<CredentialManager> {
    let google = config.google.to_provider_config(args)?;
    Ok(CredentialManager::from_config(google, prompt)?)
}
