//! Tracing setup shared by the server and the CLI.
//!
//! ```ignore
//! use latestdoc_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::server())?;
//! ```

use thiserror::Error;
use tracing::{Level, Subscriber};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, fmt, fmt::format::FmtSpan, prelude::*};

/// Module-path prefixes of the workspace crates.
const CRATE_TARGETS: &[&str] = &[
    "latestdoc",
    "latestdoc_core",
    "latestdoc_protocol",
    "latestdoc_providers",
    "latestdoc_server",
    "latestdoc_client",
];

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(#[from] TryInitError),

    #[error("invalid log filter directive: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Human-readable multi-line format
    Pretty,
    /// Compact single-line format (default)
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level applied to the workspace crates when RUST_LOG is not set
    pub default_level: Level,
    pub output_format: TracingOutputFormat,
    /// Include file/line information
    pub include_location: bool,
    /// Include the module path
    pub include_target: bool,
    pub include_timestamp: bool,
    /// Emit span open/close events
    pub include_span_events: bool,
    /// Custom env filter directive (overrides default_level and RUST_LOG)
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::WARN,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_target: false,
            include_timestamp: false,
            include_span_events: false,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Config for interactive CLI commands; `debug` raises the level.
    #[must_use]
    pub fn cli(debug: bool) -> Self {
        if debug {
            Self {
                default_level: Level::DEBUG,
                include_location: true,
                include_target: true,
                ..Self::default()
            }
        } else {
            Self::default()
        }
    }

    /// Config for the long-running tool server.
    #[must_use]
    pub fn server() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_target: true,
            include_timestamp: true,
            include_span_events: false,
            env_filter: None,
        }
    }

    /// Set the default log level
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set a custom env filter directive
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Returns the filter directive used when neither `env_filter` nor
    /// `RUST_LOG` is set.
    pub fn default_directive(&self) -> String {
        let level = self.default_level.to_string().to_lowercase();
        let mut directive = String::from("warn");
        for target in CRATE_TARGETS {
            directive.push_str(&format!(",{target}={level}"));
        }
        directive
    }
}

impl TracingConfig {
    fn build_filter(&self) -> Result<EnvFilter, TracingError> {
        if let Some(directive) = &self.env_filter {
            return Ok(EnvFilter::try_new(directive)?);
        }
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => Ok(EnvFilter::try_new(self.default_directive())?),
        }
    }

    /// Formatting layer; always writes to stderr so stdout stays clean for
    /// `fetch --json`.
    fn build_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    {
        let span_events = if self.include_span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_target(self.include_target)
            .with_span_events(span_events);

        match (self.output_format, self.include_timestamp) {
            (TracingOutputFormat::Pretty, _) => base.pretty().boxed(),
            (TracingOutputFormat::Json, _) => base.json().boxed(),
            (TracingOutputFormat::Compact, true) => base.compact().boxed(),
            (TracingOutputFormat::Compact, false) => base.compact().without_time().boxed(),
        }
    }
}

/// Installs the global subscriber. Call once at startup.
///
/// `env_filter` wins over `RUST_LOG`, which wins over `default_level`.
///
/// # Errors
///
/// Fails when a global subscriber is already installed or the filter
/// directive does not parse.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = config.build_filter()?;
    tracing_subscriber::registry()
        .with(filter)
        .with(config.build_layer())
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_config_levels() {
        assert_eq!(TracingConfig::cli(false).default_level, Level::WARN);
        let debug = TracingConfig::cli(true);
        assert_eq!(debug.default_level, Level::DEBUG);
        assert!(debug.include_location);
    }

    #[test]
    fn server_config() {
        let config = TracingConfig::server();
        assert_eq!(config.default_level, Level::INFO);
        assert!(config.include_timestamp);
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn default_directive_covers_every_crate() {
        let directive = TracingConfig::server().default_directive();
        assert!(directive.starts_with("warn,"));
        assert!(directive.contains("latestdoc_providers=info"));
        assert!(directive.contains("latestdoc_server=info"));
        assert!(EnvFilter::try_new(&directive).is_ok());
    }

    #[test]
    fn builder_methods() {
        let config = TracingConfig::default()
            .with_level(Level::TRACE)
            .with_format(TracingOutputFormat::Json)
            .with_env_filter("latestdoc_server=trace");

        assert_eq!(config.default_level, Level::TRACE);
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert_eq!(config.env_filter.as_deref(), Some("latestdoc_server=trace"));
    }
}
