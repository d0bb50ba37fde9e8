use std::collections::BTreeMap;

use tracing::debug;

use super::{ConfigLayer, FieldSources};
use crate::keys::TelemetryKey;
use crate::types::TelemetryConfig;

/// Mark every key of `config` as coming from the defaults layer.
pub fn record_defaults(config: &TelemetryConfig, sources: &mut FieldSources) {
    for (key, _) in config.iter() {
        sources.insert(key, ConfigLayer::Defaults);
    }
}

/// Overwrite `config` with every known key in `values`, recording `layer` as
/// the source of each one.
///
/// Returns the names in `values` that are not part of the catalogue, in
/// sorted order. They are left out of `config` entirely.
pub fn apply_layer(
    config: &mut TelemetryConfig,
    values: &BTreeMap<String, String>,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) -> Vec<String> {
    let mut ignored = Vec::new();

    for (name, value) in values {
        let Some(key) = TelemetryKey::from_env_name(name) else {
            debug!(name = %name, layer = layer.tag(), "ignoring unknown key");
            ignored.push(name.clone());
            continue;
        };

        config.set(key, value.clone());
        sources.insert(key, layer.clone());
    }

    ignored
}
