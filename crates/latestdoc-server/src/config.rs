//! Server configuration.

use std::time::Duration;

use crate::error::{ServerError, ServerResult};

/// Default TCP port of the tool server.
pub const DEFAULT_PORT: u16 = 2023;

/// Default listen host. Loopback only unless configured otherwise.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Host or IP address to listen on.
    pub host: String,

    /// TCP port. `0` lets the OS choose.
    pub port: u16,

    /// Key every request envelope must carry, when set.
    pub api_key: Option<String>,

    /// Per-operation I/O timeout on a connection.
    pub connection_timeout: Duration,

    /// Maximum concurrent connections.
    pub max_connections: usize,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("connection_timeout", &self.connection_timeout)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            connection_timeout: Duration::from_secs(30),
            max_connections: 100,
        }
    }
}

impl ServerConfig {
    /// Creates a configuration listening on `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Returns the `host:port` string to bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builder: require an API key. Empty keys are treated as unset.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    /// Builder: set connection timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Builder: set max connections.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Checks the values that would make the server unusable.
    pub fn validate(&self) -> ServerResult<()> {
        if self.host.trim().is_empty() {
            return Err(ServerError::config("host must not be empty"));
        }
        if self.max_connections == 0 {
            return Err(ServerError::config("max_connections must be at least 1"));
        }
        if self.connection_timeout.is_zero() {
            return Err(ServerError::config("connection_timeout must be positive"));
        }
        Ok(())
    }
}
