//! otelcfg Telemetry - logging setup for the otelcfg installer.
//!
//! This crate provides configurable `tracing` subscriber setup with several
//! output formats. Logs go to stderr so that stdout stays free for the
//! installer's report.
//!
//! # Example
//!
//! ```rust,no_run
//! use otelcfg_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), otelcfg_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("otelcfg_settings=trace")
//!     .with_env_override();
//!
//! setup_logging(&config)?;
//! tracing::info!("logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LOG_ENV_VAR, LogConfig, LogFormat, setup_logging};
