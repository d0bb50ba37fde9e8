//! Final report shown to the operator after a merge.
//!
//! The report is read-only: it renders what the pipeline produced and never
//! touches the settings file.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use otelcfg_config::ResolvedConfig;
use otelcfg_settings::{KeyChange, MergeReport, Platform, SettingsDocument};
use serde::Serialize;
use serde_json::Value;

use crate::theme::Theme;

/// Everything the report needs, gathered by the install command.
pub(crate) struct Report<'a> {
    /// Resolved configuration with sources.
    pub(crate) resolved: &'a ResolvedConfig,
    /// Merge result.
    pub(crate) merge: &'a MergeReport,
    /// The document as it now reads from disk (or would, for dry runs).
    pub(crate) document: &'a SettingsDocument,
    /// Detected platform, if detection succeeded.
    pub(crate) platform: Option<Platform>,
    /// Whether this was a dry run.
    pub(crate) dry_run: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    platform: Option<String>,
    settings_path: String,
    dry_run: bool,
    created: bool,
    written: bool,
    resolved: Value,
    changes: BTreeMap<&'static str, String>,
    document: Value,
    advisory: Option<&'static str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    ignored_keys: &'a [String],
}

impl Report<'_> {
    fn advisory(&self) -> Option<&'static str> {
        self.platform.and_then(Platform::advisory)
    }

    /// Render the human-readable report.
    pub(crate) fn render_text(&self) -> anyhow::Result<String> {
        let mut out = String::new();

        writeln!(out, "{}", Theme::header("Telemetry settings"))?;
        writeln!(out, "{}", Theme::separator())?;

        match self.resolved.loaded_files.first() {
            Some(file) => writeln!(out, "{}", Theme::info(&format!("Env source: {file}")))?,
            None => writeln!(
                out,
                "{}",
                Theme::info("Env source: defaults (no .env or .env.example found)")
            )?,
        }
        if !self.resolved.ignored_keys.is_empty() {
            writeln!(
                out,
                "{}",
                Theme::warning(&format!(
                    "Ignored non-telemetry keys: {}",
                    self.resolved.ignored_keys.join(", ")
                ))
            )?;
        }
        writeln!(out)?;

        writeln!(out, "{}", Theme::header("Resolved configuration"))?;
        for (key, value) in self.resolved.config.iter() {
            let source = format!("[{}]", self.resolved.source_tag(key));
            writeln!(
                out,
                "  {}  {}",
                Theme::kv(key.env_name(), value),
                Theme::dimmed(&source)
            )?;
        }
        writeln!(out)?;

        writeln!(out, "{}", Theme::header("Changes"))?;
        for (key, change) in &self.merge.outcome.changes {
            let line = match change {
                KeyChange::Added => format!("+ {key}"),
                KeyChange::Updated { previous } => format!("~ {key} (was {previous})"),
                KeyChange::Unchanged => format!("= {key}"),
            };
            writeln!(out, "  {line}")?;
        }
        writeln!(out)?;

        let path = self.merge.path.display();
        if self.dry_run {
            writeln!(
                out,
                "{}",
                Theme::warning(&format!("Dry run: {path} was not modified"))
            )?;
            writeln!(out, "{}", Theme::header("Would write"))?;
        } else if self.merge.written {
            let verb = if self.merge.created { "Created" } else { "Updated" };
            writeln!(out, "{}", Theme::success(&format!("{verb} {path}")))?;
        } else {
            writeln!(
                out,
                "{}",
                Theme::success(&format!("{path} already up to date"))
            )?;
        }
        out.push_str(&self.document.to_pretty_string()?);

        if let Some(note) = self.advisory() {
            writeln!(out)?;
            writeln!(out, "{}", Theme::warning(note))?;
        }

        Ok(out)
    }

    /// Render the machine-readable report.
    pub(crate) fn render_json(&self) -> anyhow::Result<String> {
        let changes = self
            .merge
            .outcome
            .changes
            .iter()
            .map(|(key, change)| {
                let label = match change {
                    KeyChange::Added => "added",
                    KeyChange::Updated { .. } => "updated",
                    KeyChange::Unchanged => "unchanged",
                };
                (key.env_name(), label.to_owned())
            })
            .collect();

        let report = JsonReport {
            platform: self.platform.map(|p| p.to_string()),
            settings_path: display_path(&self.merge.path),
            dry_run: self.dry_run,
            created: self.merge.created,
            written: self.merge.written,
            resolved: self.resolved.to_json(),
            changes,
            document: self.document.to_value(),
            advisory: self.advisory(),
            ignored_keys: &self.resolved.ignored_keys,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
