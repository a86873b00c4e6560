//! Secret reference resolver.
//!
//! Values in `config.toml` can point at secrets stored outside the file:
//!
//! - `env::VAR_NAME` reads `$VAR_NAME` from the environment
//! - `file::/path/to/secret` reads the file and trims surrounding whitespace
//! - anything else is returned as-is

use crate::error::{ClientError, ClientResult};

/// Resolves a value that may contain a secret reference prefix.
pub fn resolve(value: &str) -> ClientResult<String> {
    if let Some(var) = value.strip_prefix("env::") {
        std::env::var(var)
            .map_err(|_| ClientError::Config(format!("environment variable `{var}` is not set")))
    } else if let Some(path) = value.strip_prefix("file::") {
        std::fs::read_to_string(path)
            .map(|content| content.trim().to_string())
            .map_err(|e| ClientError::Config(format!("failed to read secret file `{path}`: {e}")))
    } else {
        Ok(value.to_string())
    }
}

/// Resolves an optional value; empty results count as unset.
pub fn resolve_opt(value: Option<&str>) -> ClientResult<Option<String>> {
    match value {
        Some(raw) => Ok(Some(resolve(raw)?).filter(|v| !v.is_empty())),
        None => Ok(None),
    }
}
