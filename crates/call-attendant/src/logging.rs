//! Logging setup
//!
//! Installs a `tracing-subscriber` formatter driven by the `[logging]`
//! section. `RUST_LOG` directives are honored on top of the configured level.

use crate::config::LoggingSettings;
use crate::error::{AttendantError, Result};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// The log level to use
    pub level: Level,
    /// Whether to enable JSON formatting
    pub json: bool,
    /// Whether to include file and line information
    pub file_info: bool,
    /// Application name to include in logs
    pub app_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: Level::INFO,
            json: false,
            file_info: false,
            app_name: "call-attendant".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration
    pub fn new(level: Level, app_name: impl Into<String>) -> Self {
        LoggingConfig {
            level,
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    /// Build from the `[logging]` section of the configuration file
    pub fn from_settings(settings: &LoggingSettings) -> Result<Self> {
        let mut config = Self::new(parse_log_level(&settings.level)?, "call-attendant");
        config.json = settings.json;
        config.file_info = settings.file_info;
        Ok(config)
    }

    /// Enable JSON formatting
    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }
}

/// Set up the logging system with the provided configuration
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(config.level.into());

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = if config.json {
        subscriber.with_writer(std::io::stdout).json().try_init()
    } else {
        subscriber.try_init()
    };

    installed.map_err(|e| AttendantError::config(format!("Failed to install logger: {}", e)))
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level).map_err(|_| AttendantError::config(format!("Invalid log level: {}", level)))
}

/// Log a welcome message with version info
pub fn log_welcome(config: &LoggingConfig, version: &str) {
    tracing::info!(level = %config.level, json = config.json, "Starting {} v{}", config.app_name, version);
}
