//! The fixed catalogue of telemetry settings.
//!
//! Every setting has an environment-style name (the key written into the
//! settings document), a compiled-in default, a validation rule and, for
//! six of the eight, a command-line flag that can override it.

use std::fmt;

// ---------------------------------------------------------------------------
// TelemetryKey
// ---------------------------------------------------------------------------

/// One of the eight telemetry settings managed by otelcfg.
///
/// Variant order is the order used for display and iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TelemetryKey {
    /// Master switch for telemetry export.
    EnableTelemetry,
    /// OTLP collector endpoint URL.
    Endpoint,
    /// OTLP transport protocol.
    Protocol,
    /// Logs exporter kind.
    LogsExporter,
    /// Whether user prompt text is included in exported logs.
    LogUserPrompts,
    /// Metrics exporter kind.
    MetricsExporter,
    /// Comma-separated `key=value` resource attributes.
    ResourceAttributes,
    /// Reported service name.
    ServiceName,
}

/// Accepted values for the two toggle settings.
const TOGGLE_VALUES: &[&str] = &["0", "1"];

/// Accepted OTLP protocols.
pub const PROTOCOLS: &[&str] = &["grpc", "http"];

impl TelemetryKey {
    /// All keys, in display order.
    pub const ALL: [Self; 8] = [
        Self::EnableTelemetry,
        Self::Endpoint,
        Self::Protocol,
        Self::LogsExporter,
        Self::LogUserPrompts,
        Self::MetricsExporter,
        Self::ResourceAttributes,
        Self::ServiceName,
    ];

    /// Name of the key inside the settings document's `env` object.
    #[must_use]
    pub const fn env_name(self) -> &'static str {
        match self {
            Self::EnableTelemetry => "CLAUDE_CODE_ENABLE_TELEMETRY",
            Self::Endpoint => "OTEL_EXPORTER_OTLP_ENDPOINT",
            Self::Protocol => "OTEL_EXPORTER_OTLP_PROTOCOL",
            Self::LogsExporter => "OTEL_LOGS_EXPORTER",
            Self::LogUserPrompts => "OTEL_LOG_USER_PROMPTS",
            Self::MetricsExporter => "OTEL_METRICS_EXPORTER",
            Self::ResourceAttributes => "OTEL_RESOURCE_ATTRIBUTES",
            Self::ServiceName => "OTEL_SERVICE_NAME",
        }
    }

    /// Look up a key by its env name. Unknown names return `None`.
    #[must_use]
    pub fn from_env_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.env_name() == name)
    }

    /// Compiled-in default value.
    #[must_use]
    pub const fn default_value(self) -> &'static str {
        match self {
            Self::EnableTelemetry => "1",
            Self::Endpoint => "http://localhost:4317",
            Self::Protocol => "grpc",
            Self::LogsExporter | Self::MetricsExporter => "otlp",
            Self::LogUserPrompts => "0",
            Self::ResourceAttributes => "deployment.environment=local",
            Self::ServiceName => "claude-code",
        }
    }

    /// Command-line flag that overrides this key, if any.
    #[must_use]
    pub const fn flag(self) -> Option<&'static str> {
        match self {
            Self::EnableTelemetry => Some("--enable-telemetry"),
            Self::Endpoint => Some("--endpoint"),
            Self::Protocol => Some("--protocol"),
            Self::LogUserPrompts => Some("--log-prompts"),
            Self::ResourceAttributes => Some("--resource-attributes"),
            Self::ServiceName => Some("--service-name"),
            Self::LogsExporter | Self::MetricsExporter => None,
        }
    }

    /// Validation rule applied to values for this key, whatever layer set them.
    #[must_use]
    pub const fn rule(self) -> ValueRule {
        match self {
            Self::EnableTelemetry | Self::LogUserPrompts => ValueRule::OneOf(TOGGLE_VALUES),
            Self::Protocol => ValueRule::OneOf(PROTOCOLS),
            Self::Endpoint | Self::ServiceName | Self::ResourceAttributes => ValueRule::NonEmpty,
            Self::LogsExporter | Self::MetricsExporter => ValueRule::Any,
        }
    }
}

impl fmt::Display for TelemetryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_name())
    }
}

// ---------------------------------------------------------------------------
// ValueRule
// ---------------------------------------------------------------------------

/// Constraint on the string value of a [`TelemetryKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRule {
    /// Value must be exactly one of the listed literals.
    OneOf(&'static [&'static str]),
    /// Any non-empty string.
    NonEmpty,
    /// No constraint.
    Any,
}

impl ValueRule {
    /// Check `value` against the rule.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message describing the violation.
    pub fn check(self, value: &str) -> Result<(), String> {
        match self {
            Self::OneOf(allowed) if !allowed.contains(&value) => Err(format!(
                "'{value}' is not allowed; expected one of: {}",
                allowed.join(", ")
            )),
            Self::NonEmpty if value.trim().is_empty() => Err("value must not be empty".to_owned()),
            _ => Ok(()),
        }
    }
}
