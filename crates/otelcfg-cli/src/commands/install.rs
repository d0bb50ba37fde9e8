//! The install pipeline: resolve, locate, merge, report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use otelcfg_config::{Overrides, TelemetryConfig};
use otelcfg_settings::{HostProbe, Platform, SettingsDocument, merge_settings};
use tracing::{debug, warn};

use crate::report::Report;

/// Inputs to [`run_install`], gathered from the command line.
#[derive(Debug, Clone)]
pub(crate) struct InstallOptions {
    /// Directory searched for `.env` and `.env.example`.
    pub(crate) workdir: PathBuf,
    /// Flag values that take precedence over the env file.
    pub(crate) overrides: Overrides,
    /// Explicit settings file, bypassing platform resolution.
    pub(crate) settings_file: Option<PathBuf>,
    /// Resolve and merge without writing.
    pub(crate) dry_run: bool,
    /// Emit the report as JSON.
    pub(crate) json: bool,
}

/// Run the installer and print the report to stdout.
pub(crate) fn run_install(options: &InstallOptions) -> Result<()> {
    let resolved = TelemetryConfig::resolve(&options.workdir, &options.overrides)
        .context("failed to resolve telemetry configuration")?;

    let probe = HostProbe::current();
    let (platform, path) = match &options.settings_file {
        Some(path) => {
            // Detection only feeds the advisory here.
            let platform = Platform::detect(&probe).ok();
            (platform, path.clone())
        },
        None => {
            let platform =
                Platform::detect(&probe).context("failed to detect the host platform")?;
            let path = platform
                .settings_path(&probe)
                .context("failed to locate the settings directory")?;
            (Some(platform), path)
        },
    };
    debug!(platform = ?platform, path = %path.display(), "settings target");

    let merge = merge_settings(&path, &resolved.config, options.dry_run)
        .with_context(|| format!("failed to update {}", path.display()))?;

    // Report what is actually on disk after a write.
    let on_disk = if options.dry_run {
        None
    } else {
        SettingsDocument::read(&path)
            .with_context(|| format!("failed to re-read {}", path.display()))?
    };
    let document = match &on_disk {
        Some(document) => document,
        None => {
            if !options.dry_run {
                warn!(path = %path.display(), "settings file missing after write");
            }
            &merge.document
        },
    };

    let report = Report {
        resolved: &resolved,
        merge: &merge,
        document,
        platform,
        dry_run: options.dry_run,
    };
    let rendered = if options.json {
        report.render_json()?
    } else {
        report.render_text()?
    };
    println!("{rendered}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dir: &std::path::Path) -> InstallOptions {
        InstallOptions {
            workdir: dir.to_path_buf(),
            overrides: Overrides::default(),
            settings_file: Some(dir.join("out").join("managed-settings.json")),
            dry_run: false,
            json: false,
        }
    }

    #[test]
    fn test_install_writes_explicit_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "OTEL_SERVICE_NAME=from-env\n").unwrap();

        run_install(&options(dir.path())).unwrap();

        let written = SettingsDocument::read(&dir.path().join("out/managed-settings.json"))
            .unwrap()
            .unwrap();
        let env = written.env().unwrap();
        assert_eq!(env["OTEL_SERVICE_NAME"], "from-env");
        assert_eq!(env["OTEL_EXPORTER_OTLP_PROTOCOL"], "grpc");
    }

    #[test]
    fn test_install_dry_run_leaves_disk_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.dry_run = true;
        opts.json = true;

        run_install(&opts).unwrap();

        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_install_rejects_invalid_override() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.overrides.protocol = Some("udp".to_owned());

        let err = run_install(&opts).unwrap_err();
        assert!(format!("{err:#}").contains("--protocol"));
        assert!(!dir.path().join("out").exists());
    }
}
