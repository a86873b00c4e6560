//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/latestdoc/config.toml` by default. A missing file means
//! defaults; a malformed one is an error.
//!
//! `[server].api_key` supports secret references (see [`crate::secret`]).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use latestdoc_providers::OrderBy;
use latestdoc_providers::google::{
    ConsentPrompt, ConsolePrompt, DisabledPrompt, GoogleConfig, LoopbackPrompt,
};
use latestdoc_server::{DEFAULT_HOST, DEFAULT_PORT, ServerConfig};

use crate::cli::GoogleArgs;
use crate::error::{ClientError, ClientResult};
use crate::secret;

/// Environment variable accepted as an alias of `LATESTDOC_API_KEY`.
pub const API_KEY_ALIAS_ENV: &str = "DAIN_API_KEY";

/// Configuration for the latestdoc binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Google credential and API settings.
    pub google: GoogleSettings,

    /// Tool server settings.
    pub server: ServerSettings,
}

impl ClientConfig {
    /// Loads `path`, or the default path when `None`.
    ///
    /// An explicit path must exist; the default path may be absent.
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| ClientError::Config(format!("{}: {}", path.display(), e)))
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("latestdoc")
            .join("config.toml")
    }
}

/// How the operator grants consent on first use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentMode {
    /// Print the URL and read the pasted code from stdin.
    #[default]
    Console,
    /// Open the browser and catch the redirect on a loopback port.
    Loopback,
    /// Never prompt; a token must already be stored.
    Disabled,
}

impl ConsentMode {
    pub fn prompt(self) -> Arc<dyn ConsentPrompt> {
        match self {
            Self::Console => Arc::new(ConsolePrompt::new()),
            Self::Loopback => Arc::new(LoopbackPrompt::default()),
            Self::Disabled => Arc::new(DisabledPrompt),
        }
    }
}

/// `[google]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth client or service-account JSON. Defaults to `credentials.json`
    /// in the working directory.
    pub credentials_file: Option<PathBuf>,

    /// Token file. Defaults to `token.json` in the working directory.
    pub token_path: Option<PathBuf>,

    /// Which timestamp picks the latest document.
    pub order_by: OrderBy,

    /// HTTP timeout for Google API calls, in seconds.
    pub timeout_secs: u64,

    /// How long to wait for operator consent, in seconds.
    pub consent_timeout_secs: u64,

    pub consent: ConsentMode,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            credentials_file: None,
            token_path: None,
            order_by: OrderBy::default(),
            timeout_secs: 30,
            consent_timeout_secs: 300,
            consent: ConsentMode::default(),
        }
    }
}

impl GoogleSettings {
    /// Builds the provider configuration, applying CLI overrides.
    pub fn to_provider_config(&self, args: &GoogleArgs) -> ClientResult<GoogleConfig> {
        let mut config = GoogleConfig::new()
            .with_order_by(args.order_by.unwrap_or(self.order_by))
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_consent_timeout(Duration::from_secs(self.consent_timeout_secs));

        if let Some(path) = args.credentials_file.as_ref().or(self.credentials_file.as_ref()) {
            config = config.with_credentials_file(path);
        }
        if let Some(path) = args.token_path.as_ref().or(self.token_path.as_ref()) {
            config = config.with_token_path(path);
        }

        config.validate()?;
        Ok(config)
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,

    /// Key callers must present (supports `env::` and `file::`).
    pub api_key: Option<String>,

    pub max_connections: usize,

    /// Per-operation I/O timeout on a connection, in seconds.
    pub connection_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            max_connections: 100,
            connection_timeout_secs: 30,
        }
    }
}

impl ServerSettings {
    /// Resolves the API key: the CLI flag or `LATESTDOC_API_KEY` first, then
    /// `DAIN_API_KEY`, then `[server].api_key`.
    pub fn api_key(&self, cli: Option<String>) -> ClientResult<Option<String>> {
        pick_api_key(
            cli,
            std::env::var(API_KEY_ALIAS_ENV).ok(),
            self.api_key.as_deref(),
        )
    }

    /// Builds the listener configuration, applying CLI overrides.
    pub fn to_server_config(
        &self,
        host: Option<String>,
        port: Option<u16>,
        api_key: Option<String>,
    ) -> ClientResult<ServerConfig> {
        let config = ServerConfig::new(
            host.unwrap_or_else(|| self.host.clone()),
            port.unwrap_or(self.port),
        )
        .with_api_key(self.api_key(api_key)?)
        .with_max_connections(self.max_connections)
        .with_connection_timeout(Duration::from_secs(self.connection_timeout_secs));

        config.validate()?;
        Ok(config)
    }
}

fn pick_api_key(
    cli: Option<String>,
    alias_env: Option<String>,
    configured: Option<&str>,
) -> ClientResult<Option<String>> {
    let non_empty = |key: &String| !key.is_empty();
    if let Some(key) = cli.filter(non_empty).or(alias_env.filter(non_empty)) {
        return Ok(Some(key));
    }
    secret::resolve_opt(configured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ClientConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 2023);
        assert_eq!(config.google.consent, ConsentMode::Console);

        let google = config.google.to_provider_config(&GoogleArgs::default()).unwrap();
        assert_eq!(google.credentials_file, PathBuf::from("credentials.json"));
        assert_eq!(google.token_path, PathBuf::from("token.json"));
        assert_eq!(google.order_by, OrderBy::CreatedTime);
        assert_eq!(google.consent_timeout, Duration::from_secs(300));
    }

    #[test]
    fn parse_full_config() {
        let config = ClientConfig::parse(
            r#"
[google]
credentials_file = "/etc/latestdoc/credentials.json"
token_path = "/var/lib/latestdoc/token.json"
order_by = "modified_time"
consent_timeout_secs = 60
consent = "loopback"

[server]
host = "0.0.0.0"
port = 8000
api_key = "env::LATESTDOC_TEST_UNUSED"
"#,
        )
        .unwrap();

        assert_eq!(config.google.order_by, OrderBy::ModifiedTime);
        assert_eq!(config.google.consent, ConsentMode::Loopback);
        assert_eq!(config.google.timeout_secs, 30);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.max_connections, 100);

        let google = config.google.to_provider_config(&GoogleArgs::default()).unwrap();
        assert_eq!(
            google.credentials_file,
            PathBuf::from("/etc/latestdoc/credentials.json")
        );
        assert_eq!(google.consent_timeout, Duration::from_secs(60));
    }

    #[test]
    fn unknown_consent_mode_is_rejected() {
        assert!(ClientConfig::parse("[google]\nconsent = \"carrier_pigeon\"\n").is_err());
    }

    #[test]
    fn cli_overrides_file_settings() {
        let settings = GoogleSettings {
            credentials_file: Some("from-file.json".into()),
            order_by: OrderBy::CreatedTime,
            ..Default::default()
        };
        let args = GoogleArgs {
            credentials_file: Some("from-cli.json".into()),
            token_path: None,
            order_by: Some(OrderBy::ModifiedTime),
        };

        let config = settings.to_provider_config(&args).unwrap();
        assert_eq!(config.credentials_file, PathBuf::from("from-cli.json"));
        assert_eq!(config.token_path, PathBuf::from("token.json"));
        assert_eq!(config.order_by, OrderBy::ModifiedTime);
    }

    #[test]
    fn zero_consent_timeout_is_invalid() {
        let settings = GoogleSettings {
            consent_timeout_secs: 0,
            ..Default::default()
        };
        assert!(settings.to_provider_config(&GoogleArgs::default()).is_err());
    }

    #[test]
    fn api_key_precedence() {
        let cli = Some("cli".to_string());
        let alias = Some("alias".to_string());

        assert_eq!(
            pick_api_key(cli.clone(), alias.clone(), Some("file")).unwrap(),
            Some("cli".to_string())
        );
        assert_eq!(
            pick_api_key(None, alias, Some("file")).unwrap(),
            Some("alias".to_string())
        );
        assert_eq!(
            pick_api_key(None, None, Some("file")).unwrap(),
            Some("file".to_string())
        );
        assert_eq!(pick_api_key(None, None, None).unwrap(), None);
        assert_eq!(pick_api_key(Some(String::new()), None, None).unwrap(), None);
    }

    #[test]
    fn empty_primary_key_falls_through_to_alias() {
        assert_eq!(
            pick_api_key(Some(String::new()), Some("alias".into()), Some("file")).unwrap(),
            Some("alias".to_string())
        );
        assert_eq!(
            pick_api_key(Some(String::new()), Some(String::new()), Some("file")).unwrap(),
            Some("file".to_string())
        );
    }

    #[test]
    fn configured_api_key_resolves_secret_reference() {
        unsafe {
            std::env::set_var("_LATESTDOC_CONFIG_TEST_KEY", "from-env");
        }
        let key = pick_api_key(None, None, Some("env::_LATESTDOC_CONFIG_TEST_KEY")).unwrap();
        assert_eq!(key.as_deref(), Some("from-env"));
        unsafe {
            std::env::remove_var("_LATESTDOC_CONFIG_TEST_KEY");
        }
    }

    #[test]
    fn server_config_applies_overrides() {
        let settings = ServerSettings::default();
        let config = settings
            .to_server_config(Some("0.0.0.0".into()), Some(9000), Some("k".into()))
            .unwrap();
        assert_eq!(config.addr(), "0.0.0.0:9000");
        assert_eq!(config.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn load_reads_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 4000\n").unwrap();

        let config = ClientConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 4000);

        let missing = ClientConfig::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(missing, Err(ClientError::Config(_))));
    }

    #[test]
    fn dump_round_trips_through_toml() {
        let config = ClientConfig::default();
        let dumped = toml::to_string_pretty(&config).unwrap();
        let parsed = ClientConfig::parse(&dumped).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.google.consent, config.google.consent);
    }
}
