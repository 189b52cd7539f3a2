//! Logging setup for polyforce.
//!
//! The core crates emit `tracing` events: `debug!` when schemas and models
//! are built or validation failures are collected, `trace!` for every
//! enforced call. This crate installs a `tracing-subscriber` that prints
//! them, either as JSON or in a human-readable form.
//!
//! # Example
//!
//! ```rust,ignore
//! use polyforce_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
