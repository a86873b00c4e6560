//! Error types for credential acquisition and document retrieval.

use std::fmt;
use thiserror::Error;

/// The category of a provider error.
///
/// None of these are retried: every failure surfaces on the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// The static credential file does not exist.
    CredentialFileMissing,
    /// The operator declined, or never answered, the consent prompt.
    AuthorizationDenied,
    /// The token endpoint rejected a code exchange, refresh or assertion.
    TokenExchangeFailed,
    /// The Drive list query returned no documents.
    NoDocumentsFound,
    /// A Drive or Docs API call failed (transport or non-success status).
    RemoteCallFailed,
    /// Unreadable or malformed credential file, or invalid configuration.
    ConfigurationError,
    /// An API returned JSON we could not parse.
    InvalidResponse,
    /// The token store could not be read or written.
    TokenStoreFailed,
    /// Unexpected internal state.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns the snake_case name of this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CredentialFileMissing => "credential_file_missing",
            Self::AuthorizationDenied => "authorization_denied",
            Self::TokenExchangeFailed => "token_exchange_failed",
            Self::NoDocumentsFound => "no_documents_found",
            Self::RemoteCallFailed => "remote_call_failed",
            Self::ConfigurationError => "configuration_error",
            Self::InvalidResponse => "invalid_response",
            Self::TokenStoreFailed => "token_store_failed",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised while acquiring credentials or fetching a document.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn credential_file_missing(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::CredentialFileMissing, message)
    }

    pub fn authorization_denied(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationDenied, message)
    }

    pub fn token_exchange(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::TokenExchangeFailed, message)
    }

    pub fn no_documents(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NoDocumentsFound, message)
    }

    pub fn remote_call(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RemoteCallFailed, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn token_store(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::TokenStoreFailed, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Result alias used throughout the providers crate.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_names() {
        assert_eq!(
            ProviderErrorCode::CredentialFileMissing.as_str(),
            "credential_file_missing"
        );
        assert_eq!(ProviderErrorCode::NoDocumentsFound.as_str(), "no_documents_found");
        assert_eq!(ProviderErrorCode::RemoteCallFailed.to_string(), "remote_call_failed");
    }

    #[test]
    fn provider_error_creation() {
        let err = ProviderError::no_documents("No Google Docs files found.");
        assert_eq!(err.code(), ProviderErrorCode::NoDocumentsFound);
        assert_eq!(err.message(), "No Google Docs files found.");
    }

    #[test]
    fn provider_error_display() {
        let err = ProviderError::authorization_denied("consent timed out");
        assert_eq!(err.to_string(), "authorization_denied: consent timed out");
    }

    #[test]
    fn provider_error_with_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("disk full");
        let err = ProviderError::token_store("failed to write token").with_source(io_err);
        assert!(err.source().is_some());
    }
}
