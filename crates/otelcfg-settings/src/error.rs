//! Settings error types.

use std::io;
use thiserror::Error;

/// Errors that can occur while locating, reading or writing the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The running operating system has no known settings location.
    #[error("Unsupported platform '{os}': no settings location is defined for it")]
    UnsupportedPlatform {
        /// OS identifier as reported by the host.
        os: String,
    },

    /// A variable needed to build the settings path is not set.
    #[error("Environment variable '{var}' is not set; cannot locate the settings directory")]
    MissingEnv {
        /// Name of the missing variable.
        var: String,
    },

    /// The existing settings file is not valid JSON.
    #[error(
        "Existing settings file at {path} is not valid JSON ({source}); fix or remove it, \
         or merge the telemetry keys into it by hand"
    )]
    InvalidJson {
        /// Path to the settings file.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The existing settings file is JSON but not the expected shape.
    #[error("Existing settings file at {path} has an unexpected shape: {message}")]
    UnexpectedShape {
        /// Path to the settings file.
        path: String,
        /// What was wrong.
        message: String,
    },

    /// A filesystem operation failed.
    #[error("Failed to {action} {path}: {source}")]
    Filesystem {
        /// What was being attempted (e.g. "create directory").
        action: &'static str,
        /// Path the operation was applied to.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Serializing the merged document failed.
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl SettingsError {
    pub(crate) fn fs(action: &'static str, path: &std::path::Path, source: io::Error) -> Self {
        Self::Filesystem {
            action,
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
