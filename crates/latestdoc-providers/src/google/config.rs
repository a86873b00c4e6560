//! Google credential files and client configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::fetcher::OrderBy;

/// Google's OAuth 2.0 token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Redirect URI used when an OAuth client file lists none.
const FALLBACK_REDIRECT_URI: &str = "http://localhost";

/// OAuth client registration for an installed (desktop) or web application.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URIs registered for the client, in file order.
    pub redirect_uris: Vec<String>,
}

impl ClientSecret {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uris: Vec::new(),
        }
    }

    /// Builder: set the registered redirect URIs.
    pub fn with_redirect_uris(mut self, uris: Vec<String>) -> Self {
        self.redirect_uris = uris;
        self
    }

    /// Returns the first registered redirect URI.
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_REDIRECT_URI)
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecret")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uris", &self.redirect_uris)
            .finish()
    }
}

/// A service-account key.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceAccountKey {
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Static credential loaded once from the credential file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// OAuth client; tokens come from interactive consent.
    Installed(ClientSecret),
    /// Service account; tokens come from a signed JWT assertion.
    ServiceAccount(ServiceAccountKey),
}

/// Raw shape of every supported credential file.
///
/// 1. Google Cloud Console OAuth file with an `installed` or `web` section
/// 2. Flat `client_id`/`client_secret` object
/// 3. Service-account key (`"type": "service_account"`)
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(rename = "type")]
    kind: Option<String>,
    installed: Option<NestedClient>,
    web: Option<NestedClient>,
    client_id: Option<String>,
    client_secret: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
    client_email: Option<String>,
    private_key: Option<String>,
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedClient {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl Credential {
    /// Loads the credential file at `path`.
    ///
    /// # Errors
    ///
    /// `CredentialFileMissing` if the file does not exist, `ConfigurationError`
    /// if it cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ProviderError::credential_file_missing(format!(
                "{} not found",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::configuration(format!("failed to read {}", path.display()))
                .with_source(e)
        })?;

        let credential = Self::from_json(&content)?;
        debug!(path = %path.display(), kind = credential.kind(), "loaded credential file");
        Ok(credential)
    }

    /// Parses a credential JSON document.
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
            ProviderError::configuration("failed to parse credentials JSON").with_source(e)
        })?;

        if file.kind.as_deref() == Some("service_account") {
            let (Some(client_email), Some(private_key)) = (file.client_email, file.private_key)
            else {
                return Err(ProviderError::configuration(
                    "service account key must contain client_email and private_key",
                ));
            };
            return Ok(Self::ServiceAccount(ServiceAccountKey {
                client_email,
                private_key,
                token_uri: file
                    .token_uri
                    .unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string()),
            }));
        }

        if let Some(nested) = file.installed.or(file.web) {
            return Ok(Self::Installed(
                ClientSecret::new(nested.client_id, nested.client_secret)
                    .with_redirect_uris(nested.redirect_uris),
            ));
        }

        if let (Some(client_id), Some(client_secret)) = (file.client_id, file.client_secret) {
            return Ok(Self::Installed(
                ClientSecret::new(client_id, client_secret).with_redirect_uris(file.redirect_uris),
            ));
        }

        Err(ProviderError::configuration(
            "credentials file must contain an 'installed'/'web' section, \
             'client_id'/'client_secret' at root level, or a service account key",
        ))
    }

    /// Short name of the credential kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Installed(_) => "oauth_client",
            Self::ServiceAccount(_) => "service_account",
        }
    }
}

/// Configuration for Google credential acquisition and API access.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Path to the operator-supplied credential file.
    pub credentials_file: PathBuf,

    /// Path of the persisted token file.
    pub token_path: PathBuf,

    /// OAuth scopes to request.
    pub scopes: Vec<String>,

    /// Which timestamp selects the latest document.
    pub order_by: OrderBy,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// How long to wait for the operator to complete consent.
    pub consent_timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,

    pub drive_api_base: String,
    pub docs_api_base: String,
    /// Token endpoint for code exchange and refresh.
    pub token_url: String,
}

impl GoogleConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_CONSENT_TIMEOUT_SECS: u64 = 300;

    pub const DRIVE_METADATA_SCOPE: &'static str =
        "https://www.googleapis.com/auth/drive.metadata.readonly";
    pub const DOCUMENTS_SCOPE: &'static str = "https://www.googleapis.com/auth/documents.readonly";

    pub const DRIVE_API_BASE: &'static str = "https://www.googleapis.com/drive/v3";
    pub const DOCS_API_BASE: &'static str = "https://docs.googleapis.com/v1";

    /// Creates a configuration with files in the working directory.
    pub fn new() -> Self {
        Self {
            credentials_file: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            scopes: vec![
                Self::DRIVE_METADATA_SCOPE.to_string(),
                Self::DOCUMENTS_SCOPE.to_string(),
            ],
            order_by: OrderBy::default(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            consent_timeout: Duration::from_secs(Self::DEFAULT_CONSENT_TIMEOUT_SECS),
            user_agent: format!("latestdoc/{}", env!("CARGO_PKG_VERSION")),
            drive_api_base: Self::DRIVE_API_BASE.to_string(),
            docs_api_base: Self::DOCS_API_BASE.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = path.into();
        self
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_consent_timeout(mut self, timeout: Duration) -> Self {
        self.consent_timeout = timeout;
        self
    }

    /// Points both APIs at other base URLs (e.g. a local fake server).
    pub fn with_api_bases(mut self, drive: impl Into<String>, docs: impl Into<String>) -> Self {
        self.drive_api_base = drive.into();
        self.docs_api_base = docs.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.scopes.is_empty() {
            return Err(ProviderError::configuration(
                "at least one OAuth scope is required",
            ));
        }
        if self.timeout.is_zero() {
            return Err(ProviderError::configuration(
                "HTTP timeout must be greater than zero",
            ));
        }
        if self.consent_timeout.is_zero() {
            return Err(ProviderError::configuration(
                "consent timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self::new()
    }
}
