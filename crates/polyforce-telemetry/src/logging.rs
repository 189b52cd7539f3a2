//! Structured logging for polyforce.
//!
//! # Example
//!
//! ```rust,ignore
//! use polyforce_telemetry::logging::{LogConfig, init_logging};
//!
//! let config = LogConfig::default().with_core_level("trace");
//! init_logging(&config)?;
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Tracing target of the enforcement engine.
pub const CORE_TARGET: &str = "polyforce_core";

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Default log level or filter directive (e.g. "info", "warn,my_app=debug").
    pub level: String,

    /// Level for the enforcement engine's own events. Overrides `level`
    /// for [`CORE_TARGET`] when set.
    pub core_level: Option<String>,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to include span events (new, close).
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include thread IDs.
    pub thread_ids: bool,

    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            core_level: None,
            json_format: true,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    ///
    /// Schema construction and validation failures are logged at `debug`.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            core_level: Some("debug".to_string()),
            json_format: false,
            span_events: true,
            file_line_info: true,
            thread_ids: false,
            include_target: true,
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            core_level: Some("warn".to_string()),
            ..Self::default()
        }
    }

    /// Sets the default level.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Sets the enforcement engine's level.
    #[must_use]
    pub fn with_core_level(mut self, level: impl Into<String>) -> Self {
        self.core_level = Some(level.into());
        self
    }

    /// Returns the combined filter directive.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::InvalidConfig` if a level is empty.
    pub fn filter_directive(&self) -> TelemetryResult<String> {
        if self.level.trim().is_empty() {
            return Err(TelemetryError::InvalidConfig("log level is empty".into()));
        }
        match &self.core_level {
            Some(core) if core.trim().is_empty() => Err(TelemetryError::InvalidConfig(
                "core log level is empty".into(),
            )),
            Some(core) => Ok(format!("{},{CORE_TARGET}={}", self.level, core.trim())),
            None => Ok(self.level.clone()),
        }
    }
}

/// Initializes the logging subsystem.
///
/// # Arguments
///
/// * `config` - Logging configuration
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the filter is invalid or a
/// global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.filter_directive()?)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    Ok(())
}

/// Creates an env filter from a string.
///
/// # Arguments
///
/// * `filter` - Filter string (e.g., "info", "polyforce_core=trace")
///
/// # Errors
///
/// Returns error if the filter string is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level: {e}")))
}
