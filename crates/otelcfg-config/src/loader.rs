//! Env file discovery and layered loading.
//!
//! Implements the `TelemetryConfig::load()` algorithm:
//! 1. Seed every key from the compiled-in defaults
//! 2. Merge `{dir}/.env` if it exists
//! 3. Otherwise merge `{dir}/.env.example` if it exists
//! 4. Return a `ResolvedConfig` (overrides and validation happen later)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::dotenv;
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, apply_layer, record_defaults};
use crate::show::ResolvedConfig;
use crate::types::TelemetryConfig;

/// Primary env file name, looked up in the working directory.
pub const PRIMARY_ENV_FILE: &str = ".env";

/// Fallback env file name, used only when the primary file is absent.
pub const FALLBACK_ENV_FILE: &str = ".env.example";

/// Maximum allowed env file size (1 MB).
const MAX_ENV_FILE_SIZE: u64 = 1_048_576;

/// Load defaults plus at most one env file from `dir`.
///
/// A missing primary file falls through to the fallback file; when neither
/// exists the defaults stand and the result has no loaded files.
///
/// # Errors
///
/// Returns a [`ConfigError`] if an env file exists but cannot be read, is too
/// large, or fails to parse. A malformed primary file does not fall through
/// to the fallback.
pub fn load(dir: &Path) -> ConfigResult<ResolvedConfig> {
    let mut config = TelemetryConfig::new();
    let mut field_sources = FieldSources::new();
    record_defaults(&config, &mut field_sources);

    let mut loaded_files = Vec::new();
    let mut ignored_keys = Vec::new();

    let candidates = candidate_paths(dir)
        .into_iter()
        .zip([ConfigLayer::PrimaryFile, ConfigLayer::FallbackFile]);

    let mut used = None;
    for (path, layer) in candidates {
        if let Some(values) = try_load_file(&path)? {
            used = Some((path, layer, values));
            break;
        }
    }

    if let Some((path, layer, values)) = used {
        ignored_keys = apply_layer(&mut config, &values, &layer, &mut field_sources);
        info!(
            path = %path.display(),
            keys = values.len(),
            ignored = ignored_keys.len(),
            "loaded env file"
        );
        loaded_files.push(path.display().to_string());
    } else {
        info!(dir = %dir.display(), "no .env or .env.example found, using defaults");
    }

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
        ignored_keys,
    })
}

/// Try to load a file, returning `None` if the file doesn't exist.
///
/// Uses a single read operation to avoid TOCTOU races (no separate
/// exists/metadata checks before reading).
fn try_load_file(path: &Path) -> ConfigResult<Option<BTreeMap<String, String>>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "env file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_ENV_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "env file is {} bytes, exceeding the {MAX_ENV_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    dotenv::parse(&content, &path.display().to_string()).map(Some)
}

/// Paths checked by [`load`], in lookup order.
#[must_use]
pub fn candidate_paths(dir: &Path) -> Vec<PathBuf> {
    vec![dir.join(PRIMARY_ENV_FILE), dir.join(FALLBACK_ENV_FILE)]
}
