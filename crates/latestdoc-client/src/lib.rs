//! CLI, tool server launcher and protocol client
//!
//! This crate provides the `latestdoc` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;
pub mod socket;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
pub use socket::ToolClient;
