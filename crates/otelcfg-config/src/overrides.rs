//! Command-line and identity overrides.
//!
//! Overrides are the highest-precedence layer. They are validated as a whole
//! before any value is replaced, so a bad flag never leaves a half-applied
//! configuration behind.

use tracing::info;

use crate::error::{ConfigError, ConfigResult};
use crate::keys::TelemetryKey;
use crate::merge::ConfigLayer;
use crate::show::ResolvedConfig;

/// Resource attribute used to carry the identity provider's user id.
pub const USER_ID_ATTRIBUTE: &str = "user.id";

/// Values supplied on the command line, plus an optional user identifier.
///
/// `None` means "not supplied"; the lower layers keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// `--endpoint`
    pub endpoint: Option<String>,
    /// `--service-name`
    pub service_name: Option<String>,
    /// `--enable-telemetry`
    pub enable_telemetry: Option<String>,
    /// `--protocol`
    pub protocol: Option<String>,
    /// `--log-prompts`
    pub log_prompts: Option<String>,
    /// `--resource-attributes`
    pub resource_attributes: Option<String>,
    /// User identifier from an identity provider, prepended to the resource
    /// attributes.
    pub user_id: Option<String>,
}

impl Overrides {
    /// Whether no override of any kind was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Flag-backed overrides as `(key, value)` pairs, in key order.
    fn flag_values(&self) -> impl Iterator<Item = (TelemetryKey, &str)> {
        [
            (TelemetryKey::EnableTelemetry, &self.enable_telemetry),
            (TelemetryKey::Endpoint, &self.endpoint),
            (TelemetryKey::Protocol, &self.protocol),
            (TelemetryKey::LogUserPrompts, &self.log_prompts),
            (TelemetryKey::ResourceAttributes, &self.resource_attributes),
            (TelemetryKey::ServiceName, &self.service_name),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }

    /// Check every supplied value against its key's rule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the offending flag.
    pub fn validate(&self) -> ConfigResult<()> {
        for (key, value) in self.flag_values() {
            key.rule()
                .check(value)
                .map_err(|message| ConfigError::ValidationError {
                    field: key.flag().unwrap_or(key.env_name()).to_owned(),
                    message,
                })?;
        }

        if let Some(user_id) = &self.user_id {
            if user_id.trim().is_empty() || user_id.contains(',') || user_id.contains('=') {
                return Err(ConfigError::ValidationError {
                    field: "--user-id".to_owned(),
                    message: "user id must be non-empty and contain no ',' or '='".to_owned(),
                });
            }
        }

        Ok(())
    }
}

/// Apply `overrides` on top of `resolved`.
///
/// Returns the keys whose value was replaced, in key order. A key replaced
/// by both a flag and the user id appears once.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any override fails validation; `resolved` is
/// untouched in that case.
pub fn apply(overrides: &Overrides, resolved: &mut ResolvedConfig) -> ConfigResult<Vec<TelemetryKey>> {
    overrides.validate()?;
    if overrides.is_empty() {
        return Ok(Vec::new());
    }

    let mut replaced = Vec::new();
    for (key, value) in overrides.flag_values() {
        let previous = resolved.config.set(key, value);
        resolved.field_sources.insert(key, ConfigLayer::CommandLine);
        info!(key = %key, from = %previous, to = %value, "flag override applied");
        replaced.push(key);
    }

    if let Some(user_id) = &overrides.user_id {
        let key = TelemetryKey::ResourceAttributes;
        let attributes = prepend_user_id(resolved.config.get(key), user_id);
        resolved.config.set(key, attributes);
        resolved.field_sources.insert(key, ConfigLayer::Identity);
        info!(key = %key, user_id = %user_id, "identity override applied");
        if !replaced.contains(&key) {
            replaced.push(key);
        }
    }

    replaced.sort();
    Ok(replaced)
}

/// Put `user.id=<id>` at the front of a resource attribute list.
///
/// A leading `user.id` entry is replaced; every other entry is kept exactly
/// as written.
#[must_use]
pub fn prepend_user_id(attributes: &str, user_id: &str) -> String {
    let prefix = format!("{USER_ID_ATTRIBUTE}=");
    let entry = format!("{prefix}{user_id}");

    let (first, rest) = match attributes.split_once(',') {
        Some((first, rest)) => (first, Some(rest)),
        None => (attributes, None),
    };
    let remainder = if first.trim_start().starts_with(&prefix) {
        rest.unwrap_or_default()
    } else {
        attributes
    };

    if remainder.is_empty() {
        entry
    } else {
        format!("{entry},{remainder}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{FieldSources, record_defaults};
    use crate::types::TelemetryConfig;

    fn defaults() -> ResolvedConfig {
        let config = TelemetryConfig::new();
        let mut field_sources = FieldSources::new();
        record_defaults(&config, &mut field_sources);
        ResolvedConfig {
            config,
            field_sources,
            loaded_files: Vec::new(),
            ignored_keys: Vec::new(),
        }
    }

    #[test]
    fn test_empty_overrides_change_nothing() {
        let mut resolved = defaults();
        let replaced = apply(&Overrides::default(), &mut resolved).unwrap();
        assert!(replaced.is_empty());
        assert_eq!(resolved.config, TelemetryConfig::new());
        assert!(Overrides::default().is_empty());
    }

    #[test]
    fn test_flag_overrides_replace_values() {
        let mut resolved = defaults();
        let overrides = Overrides {
            protocol: Some("http".to_owned()),
            service_name: Some("svc".to_owned()),
            ..Overrides::default()
        };

        let replaced = apply(&overrides, &mut resolved).unwrap();
        assert_eq!(
            replaced,
            vec![TelemetryKey::Protocol, TelemetryKey::ServiceName]
        );
        assert_eq!(resolved.config.get(TelemetryKey::Protocol), "http");
        assert_eq!(
            resolved.field_sources.get(&TelemetryKey::Protocol),
            Some(&ConfigLayer::CommandLine)
        );
        assert_eq!(
            resolved.field_sources.get(&TelemetryKey::Endpoint),
            Some(&ConfigLayer::Defaults)
        );
    }

    #[test]
    fn test_invalid_toggle_rejected_before_any_change() {
        let mut resolved = defaults();
        let overrides = Overrides {
            service_name: Some("svc".to_owned()),
            enable_telemetry: Some("2".to_owned()),
            ..Overrides::default()
        };

        let err = apply(&overrides, &mut resolved).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "--enable-telemetry");
            },
            other => panic!("expected ValidationError, got {other:?}"),
        }
        assert_eq!(resolved.config.get(TelemetryKey::ServiceName), "claude-code");
    }

    #[test]
    fn test_invalid_protocol_and_prompts_rejected() {
        let bad_protocol = Overrides {
            protocol: Some("udp".to_owned()),
            ..Overrides::default()
        };
        assert!(bad_protocol.validate().is_err());

        let bad_prompts = Overrides {
            log_prompts: Some("yes".to_owned()),
            ..Overrides::default()
        };
        assert!(bad_prompts.validate().is_err());

        let empty_endpoint = Overrides {
            endpoint: Some(String::new()),
            ..Overrides::default()
        };
        assert!(empty_endpoint.validate().is_err());
    }

    #[test]
    fn test_user_id_prepended() {
        let mut resolved = defaults();
        let overrides = Overrides {
            user_id: Some("alice".to_owned()),
            ..Overrides::default()
        };

        let replaced = apply(&overrides, &mut resolved).unwrap();
        assert_eq!(replaced, vec![TelemetryKey::ResourceAttributes]);
        assert_eq!(
            resolved.config.get(TelemetryKey::ResourceAttributes),
            "user.id=alice,deployment.environment=local"
        );
        assert_eq!(
            resolved.field_sources.get(&TelemetryKey::ResourceAttributes),
            Some(&ConfigLayer::Identity)
        );
    }

    #[test]
    fn test_user_id_applies_after_resource_flag() {
        let mut resolved = defaults();
        let overrides = Overrides {
            resource_attributes: Some("team=core".to_owned()),
            user_id: Some("bob".to_owned()),
            ..Overrides::default()
        };

        let replaced = apply(&overrides, &mut resolved).unwrap();
        assert_eq!(replaced, vec![TelemetryKey::ResourceAttributes]);
        assert_eq!(
            resolved.config.get(TelemetryKey::ResourceAttributes),
            "user.id=bob,team=core"
        );
    }

    #[test]
    fn test_user_id_validation() {
        for bad in ["", "  ", "a,b", "a=b"] {
            let overrides = Overrides {
                user_id: Some(bad.to_owned()),
                ..Overrides::default()
            };
            assert!(overrides.validate().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_prepend_user_id_is_idempotent() {
        let once = prepend_user_id("team=core", "alice");
        let twice = prepend_user_id(&once, "alice");
        assert_eq!(once, "user.id=alice,team=core");
        assert_eq!(twice, once);
        assert_eq!(prepend_user_id("", "alice"), "user.id=alice");
        assert_eq!(
            prepend_user_id("user.id=old,team=core", "new"),
            "user.id=new,team=core"
        );
        assert_eq!(prepend_user_id("user.id=old", "new"), "user.id=new");
    }

    #[test]
    fn test_prepend_user_id_keeps_other_entries_verbatim() {
        assert_eq!(
            prepend_user_id("team=core, region = eu,,user.id=x", "alice"),
            "user.id=alice,team=core, region = eu,,user.id=x"
        );
        assert_eq!(
            prepend_user_id("user.id=old, team=core", "new"),
            "user.id=new, team=core"
        );
    }
}
