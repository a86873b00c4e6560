//! OAuth 2.0 flows for Google APIs.
//!
//! Two grants are supported:
//!
//! - Authorization Code with PKCE, for OAuth client credentials. The
//!   authorization URL is handed to a [`ConsentPrompt`](super::ConsentPrompt)
//!   which returns the code; the code and verifier are then exchanged here.
//! - JWT bearer (RFC 7523), for service-account keys. A short-lived RS256
//!   assertion is signed with the key and exchanged at the key's `token_uri`.
//!
//! Refreshing uses the standard `refresh_token` grant.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rand::Rng as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::fetcher::BoxFuture;

use super::config::{ClientSecret, GoogleConfig, ServiceAccountKey};
use super::tokens::TokenInfo;

/// Google's consent page.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// The PKCE code verifier length (in bytes, before base64 encoding).
const CODE_VERIFIER_LENGTH: usize = 32;

/// Lifetime requested for service-account assertions (Google's maximum).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// PKCE flow state and utilities.
///
/// Implements RFC 7636 (Proof Key for Code Exchange).
#[derive(Debug, Clone)]
pub struct PkceFlow {
    /// The code verifier (high-entropy random string).
    pub verifier: String,
    /// The code challenge (SHA-256 hash of verifier, base64url encoded).
    pub challenge: String,
    /// Random state for CSRF protection.
    pub state: String,
}

impl PkceFlow {
    /// Creates a new PKCE flow with random verifier and state.
    pub fn new() -> Self {
        let verifier = Self::random_token(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);
        let state = Self::random_token(16);

        Self {
            verifier,
            challenge,
            state,
        }
    }

    fn random_token(len: usize) -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    /// Computes the SHA-256 challenge for a code verifier.
    fn compute_challenge(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }

    /// Builds the Google OAuth authorization URL.
    ///
    /// `access_type=offline` asks for a refresh token.
    pub fn build_auth_url(&self, client_id: &str, redirect_uri: &str, scopes: &[String]) -> String {
        let scope = scopes.join(" ");

        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&\
            access_type=offline&prompt=consent",
            GOOGLE_AUTH_URL,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters of an authorization-code exchange.
#[derive(Debug, Clone, Copy)]
pub struct CodeExchange<'a> {
    pub client: &'a ClientSecret,
    pub code: &'a str,
    pub verifier: &'a str,
    /// Must equal the redirect URI of the authorization URL.
    pub redirect_uri: &'a str,
    pub scopes: &'a [String],
}

/// Exchanges grants for tokens.
///
/// [`OAuthClient`] talks to Google; tests substitute a fake.
pub trait TokenEndpoint: Send + Sync {
    /// Exchanges an authorization code for a token.
    fn exchange_code<'a>(&'a self, request: CodeExchange<'a>)
    -> BoxFuture<'a, ProviderResult<TokenInfo>>;

    /// Refreshes an expired token. `token` must carry a refresh token.
    fn refresh<'a>(
        &'a self,
        client: &'a ClientSecret,
        token: &'a TokenInfo,
    ) -> BoxFuture<'a, ProviderResult<TokenInfo>>;

    /// Obtains a token for a service account.
    fn service_account_token<'a>(
        &'a self,
        key: &'a ServiceAccountKey,
        scopes: &'a [String],
    ) -> BoxFuture<'a, ProviderResult<TokenInfo>>;
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Space-separated scopes actually granted.
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    /// Granted scopes, or `requested` when the endpoint did not echo them.
    fn granted_scopes(&self, requested: &[String]) -> Vec<String> {
        match &self.scope {
            Some(scope) if !scope.trim().is_empty() => {
                scope.split_whitespace().map(String::from).collect()
            }
            _ => requested.to_vec(),
        }
    }
}

/// JWT claims for the service-account assertion.
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// HTTP client for Google's OAuth token endpoint.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http_client: reqwest::Client,
    token_url: String,
}

impl OAuthClient {
    /// Creates a client posting to `token_url`.
    pub fn new(token_url: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::internal("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            http_client,
            token_url: token_url.into(),
        })
    }

    /// Creates a client from the token URL and timeout of `config`.
    pub fn from_config(config: &GoogleConfig) -> ProviderResult<Self> {
        Self::new(&config.token_url, config.timeout)
    }

    async fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
        what: &str,
    ) -> ProviderResult<TokenResponse> {
        let response = self
            .http_client
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                ProviderError::token_exchange(format!("{what} request failed")).with_source(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::token_exchange("failed to read token response").with_source(e)
        })?;

        if !status.is_success() {
            return Err(ProviderError::token_exchange(format!(
                "{what} failed ({status}): {body}"
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response("invalid token response").with_source(e)
        })
    }

    fn sign_assertion(key: &ServiceAccountKey, scopes: &[String]) -> ProviderResult<String> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: scopes.join(" "),
            aud: &key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            ProviderError::configuration("service account private key is not a valid RSA PEM")
                .with_source(e)
        })?;

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key).map_err(|e| {
            ProviderError::token_exchange("failed to sign service account assertion").with_source(e)
        })
    }
}

impl TokenEndpoint for OAuthClient {
    fn exchange_code<'a>(
        &'a self,
        request: CodeExchange<'a>,
    ) -> BoxFuture<'a, ProviderResult<TokenInfo>> {
        Box::pin(async move {
            let params = [
                ("client_id", request.client.client_id.as_str()),
                ("client_secret", request.client.client_secret.as_str()),
                ("code", request.code),
                ("code_verifier", request.verifier),
                ("grant_type", "authorization_code"),
                ("redirect_uri", request.redirect_uri),
            ];

            let response = self
                .post_form(&self.token_url, &params, "token exchange")
                .await?;

            info!("obtained tokens from authorization code");
            let scopes = response.granted_scopes(request.scopes);
            Ok(TokenInfo::new(
                response.access_token,
                response.refresh_token,
                response.expires_in,
                scopes,
            ))
        })
    }

    fn refresh<'a>(
        &'a self,
        client: &'a ClientSecret,
        token: &'a TokenInfo,
    ) -> BoxFuture<'a, ProviderResult<TokenInfo>> {
        Box::pin(async move {
            let refresh_token = token.refresh_token.as_deref().ok_or_else(|| {
                ProviderError::token_exchange("no refresh token, re-authorization required")
            })?;

            let params = [
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ];

            let response = self
                .post_form(&self.token_url, &params, "token refresh")
                .await?;

            info!("refreshed access token");
            Ok(token.refreshed(
                response.access_token,
                response.expires_in,
                response.refresh_token,
            ))
        })
    }

    fn service_account_token<'a>(
        &'a self,
        key: &'a ServiceAccountKey,
        scopes: &'a [String],
    ) -> BoxFuture<'a, ProviderResult<TokenInfo>> {
        Box::pin(async move {
            let assertion = Self::sign_assertion(key, scopes)?;
            debug!(client_email = %key.client_email, "exchanging service account assertion");

            let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];
            let response = self
                .post_form(&key.token_uri, &params, "service account token")
                .await?;

            info!(client_email = %key.client_email, "obtained service account token");
            Ok(TokenInfo::new(
                response.access_token,
                None,
                response.expires_in,
                scopes.to_vec(),
            ))
        })
    }
}
