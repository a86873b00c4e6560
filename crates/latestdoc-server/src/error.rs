//! Failures raised while serving the tool protocol.

use std::io;

use latestdoc_protocol::ProtocolError;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket-level failure on the listener or a connection.
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),

    /// A frame could not be read, written or decoded.
    #[error("wire protocol: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The server configuration is unusable.
    #[error("invalid server configuration: {message}")]
    Config { message: String },

    /// Returned once shutdown has been triggered; the accept loop and
    /// connection handlers stop on it.
    #[error("server is shutting down")]
    Shutdown,
}

impl ServerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn bind(addr: impl Into<String>, source: io::Error) -> Self {
        Self::Bind {
            addr: addr.into(),
            source,
        }
    }
}
