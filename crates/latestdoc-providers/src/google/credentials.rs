//! Credential acquisition for the Drive/Docs client.
//!
//! [`CredentialManager`] turns the static credential file and the persisted
//! token into an authenticated [`GoogleDocsClient`]:
//!
//! 1. Load the credential file (fails fast when it is missing).
//! 2. Reuse a stored token that is unexpired and carries the required scopes.
//! 3. Refresh an expired token that has a refresh token.
//! 4. Otherwise obtain a new token: operator consent for OAuth clients, a
//!    signed assertion for service accounts.
//!
//! Acquisition is serialised, so overlapping callers never run two consent
//! flows at once.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};

use super::client::GoogleDocsClient;
use super::config::{ClientSecret, Credential, GoogleConfig};
use super::oauth::{CodeExchange, OAuthClient, PkceFlow, TokenEndpoint};
use super::prompt::{ConsentPrompt, ConsentRequest};
use super::tokens::{FileTokenStore, TokenInfo, TokenStore};

/// Produces authenticated API clients.
pub struct CredentialManager {
    config: GoogleConfig,
    store: Arc<dyn TokenStore>,
    endpoint: Arc<dyn TokenEndpoint>,
    prompt: Arc<dyn ConsentPrompt>,
    /// Guards acquisition and caches the parsed credential file.
    credential: Mutex<Option<Credential>>,
}

impl CredentialManager {
    pub fn new(
        config: GoogleConfig,
        store: Arc<dyn TokenStore>,
        endpoint: Arc<dyn TokenEndpoint>,
        prompt: Arc<dyn ConsentPrompt>,
    ) -> Self {
        Self {
            config,
            store,
            endpoint,
            prompt,
            credential: Mutex::new(None),
        }
    }

    /// Creates a manager backed by the token file and Google's token endpoint.
    pub fn from_config(
        config: GoogleConfig,
        prompt: Arc<dyn ConsentPrompt>,
    ) -> ProviderResult<Self> {
        config.validate()?;
        let store = Arc::new(FileTokenStore::new(&config.token_path));
        let endpoint = Arc::new(OAuthClient::from_config(&config)?);
        Ok(Self::new(config, store, endpoint, prompt))
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Returns a client authenticated with a valid token.
    ///
    /// # Errors
    ///
    /// `CredentialFileMissing` when the credential file is absent,
    /// `AuthorizationDenied` when consent fails or times out,
    /// `TokenExchangeFailed` when the token endpoint rejects the grant.
    pub async fn acquire_client(&self) -> ProviderResult<GoogleDocsClient> {
        let token = self.acquire_token().await?;
        GoogleDocsClient::new(token.access_token, &self.config)
    }

    /// Returns a valid token, obtaining or refreshing one as needed.
    pub async fn acquire_token(&self) -> ProviderResult<TokenInfo> {
        let mut guard = self.credential.lock().await;
        let credential = match guard.as_ref() {
            Some(credential) => credential.clone(),
            None => {
                let credential = Credential::from_file(&self.config.credentials_file)?;
                *guard = Some(credential.clone());
                credential
            }
        };

        if let Some(token) = self.store.load()? {
            if !token.has_scopes(&self.config.scopes) {
                info!("stored token lacks required scopes, re-authorizing");
            } else if !token.is_expired() {
                debug!("reusing stored token");
                return Ok(token);
            } else if token.refresh_token.is_some()
                && let Credential::Installed(client) = &credential
            {
                debug!("stored token expired, refreshing");
                let refreshed = self.endpoint.refresh(client, &token).await?;
                self.store.save(&refreshed)?;
                return Ok(refreshed);
            } else {
                debug!("stored token expired and cannot be refreshed");
            }
        }

        self.obtain_new_token(&credential).await
    }

    /// Discards any stored token and obtains a new one.
    pub async fn reauthorize(&self) -> ProviderResult<TokenInfo> {
        let mut guard = self.credential.lock().await;
        let credential = Credential::from_file(&self.config.credentials_file)?;
        *guard = Some(credential.clone());

        self.store.clear()?;
        self.obtain_new_token(&credential).await
    }

    async fn obtain_new_token(&self, credential: &Credential) -> ProviderResult<TokenInfo> {
        let token = match credential {
            Credential::Installed(client) => self.run_consent(client).await?,
            Credential::ServiceAccount(key) => {
                self.endpoint
                    .service_account_token(key, &self.config.scopes)
                    .await?
            }
        };
        self.store.save(&token)?;
        Ok(token)
    }

    async fn run_consent(&self, client: &ClientSecret) -> ProviderResult<TokenInfo> {
        let pkce = PkceFlow::new();
        let request = ConsentRequest {
            client,
            scopes: &self.config.scopes,
            pkce: &pkce,
        };

        let timeout = self.config.consent_timeout;
        let authorization = tokio::time::timeout(timeout, self.prompt.obtain_code(request))
            .await
            .map_err(|_| {
                warn!(timeout_secs = timeout.as_secs(), "consent timed out");
                ProviderError::authorization_denied(format!(
                    "no authorization code received within {}s",
                    timeout.as_secs()
                ))
            })??;

        info!("authorization code received, exchanging for token");
        self.endpoint
            .exchange_code(CodeExchange {
                client,
                code: &authorization.code,
                verifier: &pkce.verifier,
                redirect_uri: &authorization.redirect_uri,
                scopes: &self.config.scopes,
            })
            .await
    }
}
