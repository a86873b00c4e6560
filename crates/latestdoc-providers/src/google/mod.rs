//! Google Drive/Docs access.
//!
//! # Authentication Flow
//!
//! 1. The operator supplies a credential file: an OAuth client downloaded from
//!    the Google Cloud Console, or a service-account key
//! 2. A persisted token is reused while valid and refreshed once expired
//! 3. Without a usable token, OAuth clients go through operator consent
//!    ([`ConsolePrompt`] or [`LoopbackPrompt`]) with a PKCE challenge, and the
//!    returned code is exchanged for tokens; service accounts sign a JWT
//!    assertion instead
//! 4. Tokens are persisted through a [`TokenStore`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use latestdoc_providers::google::{CredentialManager, GoogleConfig, ConsolePrompt};
//! use latestdoc_providers::fetch_latest_document;
//!
//! let config = GoogleConfig::new();
//! let order_by = config.order_by;
//! let manager = CredentialManager::from_config(config, Arc::new(ConsolePrompt::new()))?;
//! let client = manager.acquire_client().await?;
//! let document = fetch_latest_document(&client, order_by).await?;
//! ```

mod client;
mod config;
mod credentials;
mod oauth;
mod prompt;
mod tokens;

pub use client::GoogleDocsClient;
pub use config::{ClientSecret, Credential, GOOGLE_TOKEN_URL, GoogleConfig, ServiceAccountKey};
pub use credentials::CredentialManager;
pub use oauth::{CodeExchange, GOOGLE_AUTH_URL, OAuthClient, PkceFlow, TokenEndpoint};
pub use prompt::{
    AuthorizationCode, ConsentPrompt, ConsentRequest, ConsolePrompt, DisabledPrompt,
    LoopbackPrompt,
};
pub use tokens::{FileTokenStore, MemoryTokenStore, TokenInfo, TokenStore};
