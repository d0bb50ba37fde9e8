//! The persisted settings document.
//!
//! The document is an arbitrary JSON object owned by another tool. Only the
//! eight telemetry entries under `env` are ours; everything else is carried
//! through untouched.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use otelcfg_config::{TelemetryConfig, TelemetryKey};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{SettingsError, SettingsResult};

/// Key of the nested object holding environment entries.
pub const ENV_KEY: &str = "env";

/// Maximum size of an existing settings file that will be parsed (4 MB).
const MAX_SETTINGS_FILE_SIZE: u64 = 4_194_304;

/// Permission bits for a settings file created from scratch.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

// ---------------------------------------------------------------------------
// Merge outcome
// ---------------------------------------------------------------------------

/// What happened to one telemetry key during a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyChange {
    /// The key was not present before.
    Added,
    /// The key was present with a different value (shown as JSON).
    Updated {
        /// Previous value rendered as JSON text.
        previous: String,
    },
    /// The key already had the resolved value.
    Unchanged,
}

/// Per-key result of [`SettingsDocument::merge_env`], in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// One entry per telemetry key.
    pub changes: Vec<(TelemetryKey, KeyChange)>,
}

impl MergeOutcome {
    /// Whether the merge modified the document.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changes
            .iter()
            .all(|(_, change)| *change == KeyChange::Unchanged)
    }

    /// Number of keys with the given kind of change.
    #[must_use]
    pub fn count(&self, pred: impl Fn(&KeyChange) -> bool) -> usize {
        self.changes.iter().filter(|(_, c)| pred(c)).count()
    }
}

// ---------------------------------------------------------------------------
// SettingsDocument
// ---------------------------------------------------------------------------

/// A settings document: a JSON object with an optional `env` object.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDocument {
    root: Map<String, Value>,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsDocument {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self { root: Map::new() }
    }

    /// Parse a document from JSON text. `path` is only used in errors.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidJson`] if `text` is not JSON, or
    /// [`SettingsError::UnexpectedShape`] if the root or `env` is not an object.
    pub fn parse(text: &str, path: &Path) -> SettingsResult<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| SettingsError::InvalidJson {
            path: path.display().to_string(),
            source: e,
        })?;

        let Value::Object(root) = value else {
            return Err(SettingsError::UnexpectedShape {
                path: path.display().to_string(),
                message: "top-level value is not an object".to_owned(),
            });
        };

        if let Some(env) = root.get(ENV_KEY) {
            if !env.is_object() {
                return Err(SettingsError::UnexpectedShape {
                    path: path.display().to_string(),
                    message: format!("'{ENV_KEY}' is not an object"),
                });
            }
        }

        Ok(Self { root })
    }

    /// Read the document at `path`, returning `None` if it does not exist.
    ///
    /// Uses a single read operation; no separate existence check.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] if the file cannot be read, is too large,
    /// or does not parse.
    pub fn read(path: &Path) -> SettingsResult<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "settings file not found");
                return Ok(None);
            },
            Err(e) => return Err(SettingsError::fs("read", path, e)),
        };

        if content.len() as u64 > MAX_SETTINGS_FILE_SIZE {
            return Err(SettingsError::UnexpectedShape {
                path: path.display().to_string(),
                message: format!(
                    "file is {} bytes, exceeding the {MAX_SETTINGS_FILE_SIZE} byte limit",
                    content.len()
                ),
            });
        }

        Self::parse(&content, path).map(Some)
    }

    /// The `env` object, if present.
    #[must_use]
    pub fn env(&self) -> Option<&Map<String, Value>> {
        self.root.get(ENV_KEY).and_then(Value::as_object)
    }

    /// The whole document as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    /// Set every telemetry key under `env` to its resolved value.
    ///
    /// Creates `env` if missing. Other `env` entries and all other top-level
    /// keys are left as they are.
    pub fn merge_env(&mut self, config: &TelemetryConfig) -> MergeOutcome {
        let env = self
            .root
            .entry(ENV_KEY)
            .or_insert_with(|| Value::Object(Map::new()));

        // `parse` guarantees an existing `env` is an object.
        if !env.is_object() {
            *env = Value::Object(Map::new());
        }
        let Value::Object(env) = env else {
            return MergeOutcome::default();
        };

        let mut outcome = MergeOutcome::default();
        for (key, value) in config.iter() {
            let new_val = Value::String(value.to_owned());
            let change = match env.insert(key.env_name().to_owned(), new_val.clone()) {
                None => KeyChange::Added,
                Some(old) if old == new_val => KeyChange::Unchanged,
                Some(old) => KeyChange::Updated {
                    previous: old.to_string(),
                },
            };
            outcome.changes.push((key, change));
        }
        outcome
    }

    /// Pretty-printed JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Serialize`] if serialization fails.
    pub fn to_pretty_string(&self) -> SettingsResult<String> {
        let mut text = serde_json::to_string_pretty(&self.root).map_err(SettingsError::Serialize)?;
        text.push('\n');
        Ok(text)
    }

    /// Write the document to `path`, replacing any existing file atomically.
    ///
    /// The content goes to a temporary file in the same directory, which is
    /// synced and then renamed over `path`. If any step fails the temporary
    /// file is removed and `path` is left as it was. On Unix the replaced
    /// file's permission bits are carried over, and a new file gets `0644`.
    ///
    /// When `path` is a symlink, the file it points at is replaced and the
    /// link is kept.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Filesystem`] naming the failing step.
    pub fn write_atomic(&self, path: &Path) -> SettingsResult<()> {
        let content = self.to_pretty_string()?;
        let target = resolve_symlink(path)?;
        let path = target.as_path();

        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent)
            .map_err(|e| SettingsError::fs("create directory", parent, e))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".otelcfg-")
            .suffix(".tmp")
            .tempfile_in(parent)
            .map_err(|e| SettingsError::fs("create temp file in", parent, e))?;

        tmp.write_all(content.as_bytes())
            .map_err(|e| SettingsError::fs("write temp file for", path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let permissions = std::fs::metadata(path).map_or_else(
                |_| std::fs::Permissions::from_mode(NEW_FILE_MODE),
                |existing| existing.permissions(),
            );
            tmp.as_file()
                .set_permissions(permissions)
                .map_err(|e| SettingsError::fs("set permissions on temp file for", path, e))?;
        }

        tmp.as_file()
            .sync_all()
            .map_err(|e| SettingsError::fs("sync temp file for", path, e))?;

        tmp.persist(path)
            .map_err(|e| SettingsError::fs("replace", path, e.error))?;

        debug!(path = %path.display(), bytes = content.len(), "wrote settings file");
        Ok(())
    }
}

/// The real file behind `path` when it is a symlink, otherwise `path`.
fn resolve_symlink(path: &Path) -> SettingsResult<PathBuf> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => std::fs::canonicalize(path)
            .map_err(|e| SettingsError::fs("resolve symlink", path, e)),
        _ => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: &Value) -> SettingsDocument {
        SettingsDocument::parse(&value.to_string(), Path::new("test.json")).unwrap()
    }

    #[test]
    fn test_merge_into_empty_document() {
        let mut document = SettingsDocument::new();
        let outcome = document.merge_env(&TelemetryConfig::new());

        assert_eq!(outcome.count(|c| *c == KeyChange::Added), 8);
        let env = document.env().unwrap();
        assert_eq!(env.len(), 8);
        assert_eq!(env["OTEL_EXPORTER_OTLP_PROTOCOL"], "grpc");
        assert_eq!(document.to_value().as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_merge_preserves_unrelated_keys() {
        let mut document = doc(&json!({
            "other": true,
            "permissions": { "allow": ["Bash"] },
            "env": { "FOO": "bar", "OTEL_SERVICE_NAME": "old" }
        }));

        let outcome = document.merge_env(&TelemetryConfig::new());

        let value = document.to_value();
        assert_eq!(value["other"], true);
        assert_eq!(value["permissions"]["allow"][0], "Bash");
        assert_eq!(value["env"]["FOO"], "bar");
        assert_eq!(value["env"]["OTEL_SERVICE_NAME"], "claude-code");
        assert_eq!(value["env"].as_object().unwrap().len(), 9);

        let service = outcome
            .changes
            .iter()
            .find(|(k, _)| *k == TelemetryKey::ServiceName)
            .map(|(_, c)| c.clone())
            .unwrap();
        assert_eq!(
            service,
            KeyChange::Updated {
                previous: "\"old\"".to_owned()
            }
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut document = doc(&json!({ "other": 1, "env": { "FOO": "bar" } }));
        let config = TelemetryConfig::new();

        let first = document.merge_env(&config);
        let after_first = document.clone();
        let second = document.merge_env(&config);

        assert!(!first.is_noop());
        assert!(second.is_noop());
        assert_eq!(document, after_first);
    }

    #[test]
    fn test_non_string_value_is_replaced() {
        let mut document = doc(&json!({ "env": { "CLAUDE_CODE_ENABLE_TELEMETRY": 1 } }));
        let outcome = document.merge_env(&TelemetryConfig::new());

        assert_eq!(document.env().unwrap()["CLAUDE_CODE_ENABLE_TELEMETRY"], "1");
        assert_eq!(
            outcome.changes[0],
            (
                TelemetryKey::EnableTelemetry,
                KeyChange::Updated {
                    previous: "1".to_owned()
                }
            )
        );
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = SettingsDocument::parse("{ not json", Path::new("s.json")).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidJson { .. }));
    }

    #[test]
    fn test_parse_rejects_non_object_root_and_env() {
        let err = SettingsDocument::parse("[1, 2]", Path::new("s.json")).unwrap_err();
        assert!(matches!(err, SettingsError::UnexpectedShape { .. }));

        let err = SettingsDocument::parse(r#"{"env": "x"}"#, Path::new("s.json")).unwrap_err();
        assert!(matches!(err, SettingsError::UnexpectedShape { .. }));
    }

    #[test]
    fn test_read_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = SettingsDocument::read(&dir.path().join("absent.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_write_atomic_creates_parents_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("settings.json");

        let mut document = SettingsDocument::new();
        document.merge_env(&TelemetryConfig::new());
        document.write_atomic(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with('\n'));
        let reread = SettingsDocument::read(&path).unwrap().unwrap();
        assert_eq!(reread, document);

        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1, "stray files left behind: {entries:?}");
    }

    #[test]
    fn test_failed_replace_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory at the target path makes the final rename fail.
        let path = dir.path().join("settings.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        let mut document = SettingsDocument::new();
        document.merge_env(&TelemetryConfig::new());
        let result = document.write_atomic(&path);
        assert!(matches!(result, Err(SettingsError::Filesystem { .. })));

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["settings.json".to_owned()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        SettingsDocument::new().write_atomic(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
        SettingsDocument::new().write_atomic(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        SettingsDocument::new().write_atomic(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_target_is_followed() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.json");
        let link = dir.path().join("settings.json");
        std::fs::write(&real, r#"{"other": true}"#).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let mut document = SettingsDocument::read(&link).unwrap().unwrap();
        document.merge_env(&TelemetryConfig::new());
        document.write_atomic(&link).unwrap();

        assert!(
            std::fs::symlink_metadata(&link)
                .unwrap()
                .file_type()
                .is_symlink()
        );
        let reread = SettingsDocument::read(&real).unwrap().unwrap();
        assert_eq!(reread.to_value()["other"], true);
        assert_eq!(reread.env().unwrap().len(), 8);
    }
}
