//! Layered overwrite of telemetry values with source tracking.
//!
//! Each layer is a flat `name → value` map. Layers are applied in precedence
//! order, later layers replacing earlier ones key by key. Names outside the
//! [`TelemetryKey`](crate::keys::TelemetryKey) catalogue are reported back to
//! the caller and never touch the configuration.

mod layer;
mod types;

pub use layer::{apply_layer, record_defaults};
pub use types::{ConfigLayer, FieldSources};
