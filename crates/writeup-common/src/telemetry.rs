//! Tracing setup for writeup binaries.
//!
//! # Usage
//!
//! ```ignore
//! use writeup_common::telemetry::{self, TelemetryConfig};
//!
//! fn main() {
//!     telemetry::init(TelemetryConfig::from_env("writeup-cli"));
//!     tracing::info!("started");
//! }
//! ```

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for labeling (e.g., "writeup-cli")
    pub service_name: String,
    /// Console log level (default: INFO, DEBUG in debug builds)
    pub console_level: Level,
    /// Write logs to stderr instead of stdout.
    pub stderr: bool,
}

impl TelemetryConfig {
    /// Load config from environment variables.
    ///
    /// - `RUST_LOG`: Standard env filter (optional, overrides console_level)
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let console_level = if cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::INFO
        };

        Self {
            service_name: service_name.into(),
            console_level,
            stderr: true,
        }
    }
}

/// Install the global subscriber.
///
/// Returns false if a subscriber was already installed, which is expected
/// when several tests initialise telemetry in one process.
pub fn init(config: TelemetryConfig) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.console_level.as_str().to_lowercase()));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(if config.stderr {
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stderr)
        } else {
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stdout)
        })
        .compact()
        .with_filter(env_filter);

    match tracing_subscriber::registry().with(console_layer).try_init() {
        Ok(()) => {
            tracing::debug!(service = %config.service_name, "telemetry initialized");
            true
        }
        Err(_) => false,
    }
}
