//! Post-resolution validation.
//!
//! Flags are checked as they are applied, but values from env files are
//! not. This pass checks every resolved value against its key's
//! [`ValueRule`](crate::keys::ValueRule), whatever layer it came from.

use crate::error::{ConfigError, ConfigResult};
use crate::types::TelemetryConfig;

/// Validate a fully resolved configuration.
///
/// # Errors
///
/// Returns the first validation error found, in key order.
pub fn validate(config: &TelemetryConfig) -> ConfigResult<()> {
    for (key, value) in config.iter() {
        key.rule()
            .check(value)
            .map_err(|message| ConfigError::ValidationError {
                field: key.env_name().to_owned(),
                message,
            })?;
    }
    Ok(())
}
