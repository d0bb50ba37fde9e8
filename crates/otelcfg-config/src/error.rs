use std::io;
use thiserror::Error;

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read an env file.
    #[error("Failed to read env file at {path}: {source}")]
    ReadError {
        /// Path to the env file that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An env file contained a line the strict parser rejects.
    #[error("Failed to parse env file at {path}, line {line}: {message}")]
    ParseError {
        /// Path to the env file that failed to parse.
        path: String,
        /// 1-based line number of the offending line.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// A value failed validation.
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// Field (env name or flag) that failed validation.
        field: String,
        /// Validation failure description.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
