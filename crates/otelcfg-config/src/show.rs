//! Source-annotated display of the resolved configuration.
//!
//! Prints every telemetry key with the layer (defaults, env file, fallback
//! env file, flag, identity) that set its final value.

use std::fmt::{self, Write as _};

use serde_json::{Map, Value, json};

use crate::merge::{ConfigLayer, FieldSources};
use crate::types::TelemetryConfig;

/// A resolved configuration together with source annotations.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final merged configuration.
    pub config: TelemetryConfig,
    /// Key → which layer set the value.
    pub field_sources: FieldSources,
    /// Env file paths that were loaded (at most one today).
    pub loaded_files: Vec<String>,
    /// Names found in the env file that are not telemetry keys.
    pub ignored_keys: Vec<String>,
}

/// Output format for [`ResolvedConfig::show`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShowFormat {
    /// `KEY=value  # [source]` lines.
    #[default]
    Text,
    /// JSON (for programmatic consumption).
    Json,
}

impl ResolvedConfig {
    /// Format the resolved config.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn show(&self, format: ShowFormat) -> Result<String, fmt::Error> {
        match format {
            ShowFormat::Text => self.show_text(),
            ShowFormat::Json => serde_json::to_string_pretty(&self.to_json()).map_err(|_| fmt::Error),
        }
    }

    fn show_text(&self) -> Result<String, fmt::Error> {
        let mut output = String::new();

        output.push_str("# Resolved telemetry configuration\n");
        output.push_str("# Source annotations: [defaults] [env-file] [env-example] [flag] [identity]\n");

        if self.loaded_files.is_empty() {
            output.push_str("#\n# No env file found; defaults apply.\n");
        } else {
            output.push_str("#\n# Loaded files:\n");
            for (i, path) in self.loaded_files.iter().enumerate() {
                writeln!(output, "#   {}. {path}", i.saturating_add(1))?;
            }
        }

        if !self.ignored_keys.is_empty() {
            writeln!(
                output,
                "# Ignored non-telemetry keys: {}",
                self.ignored_keys.join(", ")
            )?;
        }

        output.push('\n');

        for (key, value) in self.config.iter() {
            writeln!(output, "{key}={value}  # [{}]", self.source_tag(key))?;
        }

        Ok(output)
    }

    /// JSON object of env name → `{ "value", "source" }`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut keys = Map::new();
        for (key, value) in self.config.iter() {
            keys.insert(
                key.env_name().to_owned(),
                json!({ "value": value, "source": self.source_tag(key) }),
            );
        }

        json!({
            "loaded_files": self.loaded_files,
            "ignored_keys": self.ignored_keys,
            "values": keys,
        })
    }

    /// Tag of the layer that set `key` (`defaults`, `env-file`, ...).
    #[must_use]
    pub fn source_tag(&self, key: crate::keys::TelemetryKey) -> &'static str {
        self.field_sources
            .get(&key)
            .map_or(ConfigLayer::Defaults.tag(), ConfigLayer::tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::TelemetryKey;
    use crate::merge::record_defaults;

    fn resolved() -> ResolvedConfig {
        let mut config = TelemetryConfig::new();
        let mut field_sources = FieldSources::new();
        record_defaults(&config, &mut field_sources);
        config.set(TelemetryKey::Protocol, "http");
        field_sources.insert(TelemetryKey::Protocol, ConfigLayer::CommandLine);
        ResolvedConfig {
            config,
            field_sources,
            loaded_files: vec!["/work/.env".to_owned()],
            ignored_keys: vec!["AWS_REGION".to_owned()],
        }
    }

    #[test]
    fn test_show_text_annotates_sources() {
        let output = resolved().show(ShowFormat::Text).unwrap();
        assert!(output.contains("Resolved telemetry configuration"));
        assert!(output.contains("OTEL_EXPORTER_OTLP_PROTOCOL=http  # [flag]"));
        assert!(output.contains("OTEL_SERVICE_NAME=claude-code  # [defaults]"));
        assert!(output.contains("1. /work/.env"));
        assert!(output.contains("AWS_REGION"));
    }

    #[test]
    fn test_show_text_lists_every_key_once() {
        let output = resolved().show(ShowFormat::Text).unwrap();
        for key in TelemetryKey::ALL {
            let needle = format!("{}=", key.env_name());
            assert_eq!(output.matches(&needle).count(), 1, "{key}");
        }
    }

    #[test]
    fn test_show_text_without_files() {
        let mut r = resolved();
        r.loaded_files.clear();
        let output = r.show(ShowFormat::Text).unwrap();
        assert!(output.contains("defaults apply"));
    }

    #[test]
    fn test_show_json() {
        let output = resolved().show(ShowFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            parsed["values"]["OTEL_EXPORTER_OTLP_PROTOCOL"]["value"],
            "http"
        );
        assert_eq!(
            parsed["values"]["OTEL_EXPORTER_OTLP_PROTOCOL"]["source"],
            "flag"
        );
        assert_eq!(parsed["ignored_keys"][0], "AWS_REGION");
    }
}
