//! Client error types.

use std::fmt;

use latestdoc_protocol::{ErrorResponse, ProtocolError};
use latestdoc_providers::ProviderError;
use latestdoc_server::ServerError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Credential or Google API error.
    Provider(ProviderError),
    /// The tool server failed to start or run.
    Server(ServerError),
    /// IO error.
    Io(std::io::Error),
    /// Connection to server failed.
    Connection(String),
    /// Protocol/framing error.
    Protocol(String),
    /// Request timed out.
    Timeout(String),
    /// The server answered with an error response.
    Remote(ErrorResponse),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(err) => write!(f, "provider error: {}", err),
            Self::Server(err) => write!(f, "server error: {}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Connection(msg) => write!(f, "connection error: {}", msg),
            Self::Protocol(msg) => write!(f, "protocol error: {}", msg),
            Self::Timeout(msg) => write!(f, "timeout: {}", msg),
            Self::Remote(err) => write!(f, "server returned {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            Self::Server(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl From<ServerError> for ClientError {
    fn from(err: ServerError) -> Self {
        Self::Server(err)
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Timeout { operation } => Self::Timeout(operation),
            ProtocolError::Io(err) => Self::Io(err),
            other => Self::Protocol(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latestdoc_protocol::ErrorCode;

    #[test]
    fn display_includes_context() {
        let err = ClientError::Config("missing [server] port".into());
        assert_eq!(err.to_string(), "configuration error: missing [server] port");

        let err = ClientError::from(ProviderError::no_documents("No Google Docs files found."));
        assert_eq!(
            err.to_string(),
            "provider error: no_documents_found: No Google Docs files found."
        );
    }

    #[test]
    fn remote_error_uses_code_description() {
        let err = ClientError::Remote(ErrorResponse::new(ErrorCode::Unauthorized, "bad key"));
        assert_eq!(
            err.to_string(),
            "server returned bad key (The API key is missing or invalid)"
        );
    }

    #[test]
    fn protocol_timeout_maps_to_timeout() {
        let err = ClientError::from(ProtocolError::timeout("read frame length"));
        assert!(matches!(err, ClientError::Timeout(op) if op == "read frame length"));
    }
}
