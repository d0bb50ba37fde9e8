//! Settings file placement and merging for otelcfg.
//!
//! This crate provides:
//! - Platform detection and the per-platform settings directory ([`platform`])
//! - A non-destructive merge of resolved telemetry values into the settings
//!   document's `env` object ([`document`])
//! - Atomic replacement of the settings file
//!
//! # Example
//!
//! ```rust,no_run
//! use otelcfg_config::TelemetryConfig;
//! use otelcfg_settings::{HostProbe, Platform, merge_settings};
//!
//! # fn main() -> Result<(), otelcfg_settings::SettingsError> {
//! let probe = HostProbe::current();
//! let platform = Platform::detect(&probe)?;
//! let path = platform.settings_path(&probe)?;
//!
//! let report = merge_settings(&path, &TelemetryConfig::new(), false)?;
//! println!("wrote {} ({} keys added)", report.path.display(), report.outcome.changes.len());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod document;
pub mod platform;

mod error;

use std::path::{Path, PathBuf};

use otelcfg_config::TelemetryConfig;
use tracing::info;

pub use document::{KeyChange, MergeOutcome, SettingsDocument};
pub use error::{SettingsError, SettingsResult};
pub use platform::{HostProbe, Platform};

/// Result of [`merge_settings`].
#[derive(Debug, Clone)]
pub struct MergeReport {
    /// Settings file path.
    pub path: PathBuf,
    /// Whether the file did not exist before.
    pub created: bool,
    /// Whether the file was written. False for dry runs and no-op merges.
    pub written: bool,
    /// Per-key changes.
    pub outcome: MergeOutcome,
    /// The merged document.
    pub document: SettingsDocument,
}

/// Merge `config` into the settings file at `path`.
///
/// 1. Ensure the parent directory exists (skipped for dry runs)
/// 2. Read and parse the existing document, if any
/// 3. Set the eight `env` entries, preserving everything else
/// 4. Atomically replace the file, unless this is a dry run or nothing changed
///
/// # Errors
///
/// Returns a [`SettingsError`] if the existing file is unreadable or not a
/// JSON object, or if any filesystem step fails. The existing file is left
/// untouched on every error path.
pub fn merge_settings(
    path: &Path,
    config: &TelemetryConfig,
    dry_run: bool,
) -> SettingsResult<MergeReport> {
    if !dry_run {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::fs("create directory", parent, e))?;
        }
    }

    let existing = SettingsDocument::read(path)?;
    let created = existing.is_none();
    let mut document = existing.unwrap_or_default();

    let outcome = document.merge_env(config);

    let written = !dry_run && (created || !outcome.is_noop());
    if written {
        document.write_atomic(path)?;
    }

    info!(
        path = %path.display(),
        created,
        written,
        dry_run,
        added = outcome.count(|c| *c == KeyChange::Added),
        updated = outcome.count(|c| matches!(c, KeyChange::Updated { .. })),
        "merged telemetry settings"
    );

    Ok(MergeReport {
        path: path.to_path_buf(),
        created,
        written,
        outcome,
        document,
    })
}
