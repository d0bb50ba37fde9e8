//! The resolved telemetry configuration value object.
//!
//! A [`TelemetryConfig`] always holds exactly one value for every
//! [`TelemetryKey`]. It starts from the compiled-in defaults and is only ever
//! mutated key by key, so no layer can leave a key unset.

use std::collections::BTreeMap;

use crate::keys::TelemetryKey;

/// Final key/value mapping after defaults, env file and overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    values: BTreeMap<TelemetryKey, String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        let values = TelemetryKey::ALL
            .into_iter()
            .map(|key| (key, key.default_value().to_owned()))
            .collect();
        Self { values }
    }
}

impl TelemetryConfig {
    /// Create a configuration seeded with the compiled-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for `key`.
    #[must_use]
    pub fn get(&self, key: TelemetryKey) -> &str {
        // Every key is inserted by `Default` and never removed.
        self.values.get(&key).map_or("", String::as_str)
    }

    /// Replace the value for `key`, returning the previous value.
    pub fn set(&mut self, key: TelemetryKey, value: impl Into<String>) -> String {
        self.values.insert(key, value.into()).unwrap_or_default()
    }

    /// Iterate `(key, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (TelemetryKey, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_key() {
        let config = TelemetryConfig::new();
        assert_eq!(config.iter().count(), TelemetryKey::ALL.len());
        assert_eq!(config.get(TelemetryKey::Protocol), "grpc");
        assert_eq!(config.get(TelemetryKey::ServiceName), "claude-code");
    }

    #[test]
    fn test_set_returns_previous() {
        let mut config = TelemetryConfig::new();
        let previous = config.set(TelemetryKey::Protocol, "http");
        assert_eq!(previous, "grpc");
        assert_eq!(config.get(TelemetryKey::Protocol), "http");
        assert_eq!(config.iter().count(), TelemetryKey::ALL.len());
    }

    #[test]
    fn test_iteration_follows_key_order() {
        let config = TelemetryConfig::new();
        let keys: Vec<_> = config.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, TelemetryKey::ALL.to_vec());
    }
}
