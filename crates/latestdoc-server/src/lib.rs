//! Tool server for the latest Google Doc.
//!
//! This crate provides:
//! - A TCP listener speaking the length-prefixed JSON protocol
//! - API-key authentication of request envelopes
//! - A tool registry with the `get-latest-document` tool
//! - Graceful shutdown on SIGINT/SIGTERM or a `shutdown` request
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use latestdoc_protocol::ServiceInfo;
//! use latestdoc_server::{
//!     RequestHandler, ServerConfig, SignalHandler, TcpServer, ToolRegistry,
//!     make_connection_handler,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let signals = SignalHandler::new();
//!     signals.spawn_listener();
//!
//!     let handler = RequestHandler::new(
//!         ServiceInfo::google_drive(env!("CARGO_PKG_VERSION")),
//!         ToolRegistry::new(),
//!         signals.shutdown_handle(),
//!     );
//!     let server = TcpServer::bind(ServerConfig::default()).await?;
//!     server
//!         .run_until_shutdown(make_connection_handler(Arc::new(handler)), signals.shutdown().wait())
//!         .await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod handler;
mod signals;
mod socket;
mod tool;

pub use config::{DEFAULT_HOST, DEFAULT_PORT, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use handler::{RequestHandler, make_connection_handler};
pub use signals::{ShutdownHandle, ShutdownSignal, SignalHandler};
pub use socket::{Connection, TcpServer};
pub use tool::{DocumentFetcher, GoogleDriveFetcher, LatestDocumentTool, Tool, ToolRegistry};
