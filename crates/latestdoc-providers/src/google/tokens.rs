//! OAuth token persistence.
//!
//! Tokens are persisted through a [`TokenStore`]. The file store writes JSON
//! atomically with owner-only permissions and also understands the token
//! files written by Google's Node.js client library.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Seconds subtracted from a reported lifetime so tokens are refreshed early.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// Information about an OAuth token set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// The access token for API requests.
    pub access_token: String,

    /// The refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,

    /// When the access token expires.
    pub expires_at: Option<DateTime<Utc>>,

    /// The OAuth scopes that were granted.
    pub scopes: Vec<String>,

    /// When the tokens were last refreshed.
    pub last_refresh: DateTime<Utc>,
}

impl TokenInfo {
    /// Creates a new token info from OAuth response data.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(expiry_from_now),
            scopes,
            last_refresh: Utc::now(),
        }
    }

    /// Returns true if the access token is expired or about to expire.
    ///
    /// Tokens without a recorded expiry are treated as valid.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Utc::now() >= expires_at)
    }

    /// Returns true if the token has the required scopes.
    ///
    /// An empty scope list means the grant was recorded without scopes
    /// (legacy token files often omit `scope`) and is accepted as is.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        self.scopes.is_empty() || required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Returns a copy with a refreshed access token.
    ///
    /// The refresh token is kept unless the endpoint rotated it.
    #[must_use]
    pub fn refreshed(
        &self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
        rotated_refresh_token: Option<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: rotated_refresh_token.or_else(|| self.refresh_token.clone()),
            expires_at: expires_in_secs.map(expiry_from_now),
            scopes: self.scopes.clone(),
            last_refresh: Utc::now(),
        }
    }

    /// Parses a token file in either the native or the legacy format.
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let stored: StoredToken = serde_json::from_str(json).map_err(|e| {
            ProviderError::token_store("failed to parse token file").with_source(e)
        })?;
        Ok(match stored {
            StoredToken::Native(token) => token,
            StoredToken::Legacy(legacy) => legacy.into(),
        })
    }
}

fn expiry_from_now(secs: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(secs) - Duration::seconds(EXPIRY_BUFFER_SECS)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredToken {
    Native(TokenInfo),
    Legacy(LegacyToken),
}

/// `{access_token, refresh_token, scope, token_type, expiry_date}` with the
/// expiry in epoch milliseconds.
#[derive(Deserialize)]
struct LegacyToken {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    expiry_date: Option<i64>,
}

impl From<LegacyToken> for TokenInfo {
    fn from(legacy: LegacyToken) -> Self {
        Self {
            access_token: legacy.access_token,
            refresh_token: legacy.refresh_token,
            expires_at: legacy.expiry_date.and_then(DateTime::from_timestamp_millis),
            scopes: legacy
                .scope
                .map(|s| s.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            last_refresh: Utc::now(),
        }
    }
}

/// Persistence for the OAuth token.
pub trait TokenStore: Send + Sync {
    /// Returns the persisted token, if any.
    fn load(&self) -> ProviderResult<Option<TokenInfo>>;

    /// Persists `token`, replacing any previous one.
    fn save(&self, token: &TokenInfo) -> ProviderResult<()>;

    /// Removes the persisted token.
    fn clear(&self) -> ProviderResult<()>;
}

fn poisoned<T>(_: T) -> ProviderError {
    ProviderError::internal("token cache lock poisoned")
}

/// File-backed token store with an in-memory cache.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cache: RwLock<Option<TokenInfo>>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    /// Returns the token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, token: &TokenInfo) -> ProviderResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::token_store("failed to create token directory").with_source(e)
            })?;
        }

        let content = serde_json::to_string_pretty(token).map_err(|e| {
            ProviderError::internal("failed to serialize token").with_source(e)
        })?;

        // Write to a sibling temp file and rename so readers never see a partial file.
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &content).map_err(|e| {
            ProviderError::token_store(format!("failed to write {}", temp_path.display()))
                .with_source(e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                ProviderError::token_store("failed to restrict token file permissions")
                    .with_source(e)
            })?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            ProviderError::token_store(format!("failed to replace {}", self.path.display()))
                .with_source(e)
        })?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> ProviderResult<Option<TokenInfo>> {
        if let Some(token) = self.cache.read().map_err(poisoned)?.clone() {
            return Ok(Some(token));
        }

        if !self.path.exists() {
            debug!(path = %self.path.display(), "no token file");
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::token_store(format!("failed to read {}", self.path.display()))
                .with_source(e)
        })?;
        let token = TokenInfo::from_json(&content)?;

        info!(path = %self.path.display(), "loaded token");
        *self.cache.write().map_err(poisoned)? = Some(token.clone());
        Ok(Some(token))
    }

    fn save(&self, token: &TokenInfo) -> ProviderResult<()> {
        self.write_file(token)?;
        *self.cache.write().map_err(poisoned)? = Some(token.clone());
        info!(path = %self.path.display(), "token stored");
        Ok(())
    }

    fn clear(&self) -> ProviderResult<()> {
        *self.cache.write().map_err(poisoned)? = None;
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                ProviderError::token_store(format!("failed to remove {}", self.path.display()))
                    .with_source(e)
            })?;
            info!(path = %self.path.display(), "cleared token");
        }
        Ok(())
    }
}

/// Token store that keeps the token in memory only.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<TokenInfo>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `token`.
    pub fn with_token(token: TokenInfo) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> ProviderResult<Option<TokenInfo>> {
        Ok(self.token.read().map_err(poisoned)?.clone())
    }

    fn save(&self, token: &TokenInfo) -> ProviderResult<()> {
        *self.token.write().map_err(poisoned)? = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> ProviderResult<()> {
        *self.token.write().map_err(poisoned)? = None;
        Ok(())
    }
}
