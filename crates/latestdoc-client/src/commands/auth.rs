//! Auth command: obtains a token ahead of time so the server never prompts.

use tracing::info;

use crate::cli::GoogleArgs;
use crate::config::{ClientConfig, ConsentMode};
use crate::error::ClientResult;

/// Runs the consent flow (or refresh) and persists the token.
///
/// Reuses a valid stored token unless `force` is set. A `disabled` consent
/// mode falls back to the console prompt here, since an operator is present.
pub async fn run(config: &ClientConfig, args: &GoogleArgs, force: bool) -> ClientResult<()> {
    let mode = match config.google.consent {
        ConsentMode::Disabled => ConsentMode::Console,
        mode => mode,
    };
    let manager = super::credential_manager(config, args, mode.prompt())?;

    let token = if force {
        println!("Discarding stored token and authorizing again...");
        manager.reauthorize().await?
    } else {
        manager.acquire_token().await?
    };

    info!(expires_at = ?token.expires_at, "Token acquired");
    let path = manager.config().token_path.display();
    match token.expires_at {
        Some(expires_at) => println!(
            "Token saved to {path} (expires {}).",
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => println!("Token saved to {path}."),
    }
    Ok(())
}
