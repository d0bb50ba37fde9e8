#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered resolution of telemetry settings for otelcfg.
//!
//! This crate produces a [`TelemetryConfig`]: exactly one string value for
//! each of the eight [`TelemetryKey`]s, together with a record of which layer
//! supplied each value.
//!
//! # Usage
//!
//! ```rust,no_run
//! use otelcfg_config::{Overrides, TelemetryConfig, TelemetryKey};
//!
//! let overrides = Overrides {
//!     protocol: Some("http".to_owned()),
//!     ..Overrides::default()
//! };
//! let resolved = TelemetryConfig::resolve(std::path::Path::new("."), &overrides).unwrap();
//! println!("protocol: {}", resolved.config.get(TelemetryKey::Protocol));
//! ```
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Identity** (`--user-id`), prepended to `OTEL_RESOURCE_ATTRIBUTES`
//! 2. **Flags** (`--endpoint`, `--protocol`, ...)
//! 3. **Env file** (`.env` in the working directory)
//! 4. **Fallback env file** (`.env.example`, only when `.env` is absent)
//! 5. **Compiled-in defaults**
//!
//! # Design
//!
//! Env files are parsed as data by [`dotenv`]; nothing is evaluated and the
//! process environment is never modified. Values travel between stages in
//! [`ResolvedConfig`].

/// Strict `KEY=value` env file parser.
pub mod dotenv;
/// Configuration error types.
pub mod error;
/// The telemetry key catalogue.
pub mod keys;
/// Env file discovery and loading.
pub mod loader;
/// Layered overwrite with source tracking.
pub mod merge;
/// Command-line and identity overrides.
pub mod overrides;
/// Resolved configuration display and serialization.
pub mod show;
/// The resolved configuration value object.
pub mod types;
/// Value validation rules.
pub mod validate;

// Re-export primary types at the crate root.
pub use error::{ConfigError, ConfigResult};
pub use keys::{TelemetryKey, ValueRule};
pub use merge::{ConfigLayer, FieldSources};
pub use overrides::Overrides;
pub use show::{ResolvedConfig, ShowFormat};
pub use types::TelemetryConfig;

impl TelemetryConfig {
    /// Load defaults and env files from `dir` without overrides.
    ///
    /// See [`loader::load`] for the full algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if an env file is unreadable or malformed.
    pub fn load(dir: &std::path::Path) -> ConfigResult<ResolvedConfig> {
        loader::load(dir)
    }

    /// Load from `dir`, apply `overrides`, and validate the result.
    ///
    /// Overrides are validated before any file is read.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if an override is invalid, an env file is
    /// unreadable or malformed, or the final configuration fails validation.
    pub fn resolve(dir: &std::path::Path, overrides: &Overrides) -> ConfigResult<ResolvedConfig> {
        overrides.validate()?;
        let mut resolved = loader::load(dir)?;
        overrides::apply(overrides, &mut resolved)?;
        validate::validate(&resolved.config)?;
        Ok(resolved)
    }
}
