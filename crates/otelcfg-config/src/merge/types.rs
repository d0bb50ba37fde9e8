use std::collections::HashMap;

use crate::keys::TelemetryKey;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults.
    Defaults,
    /// Primary env file (`.env`).
    PrimaryFile,
    /// Fallback env file (`.env.example`), used only when `.env` is absent.
    FallbackFile,
    /// Command-line flag.
    CommandLine,
    /// User identifier supplied by an identity provider.
    Identity,
}

impl ConfigLayer {
    /// Short tag used in annotations and JSON output.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Defaults => "defaults",
            Self::PrimaryFile => "env-file",
            Self::FallbackFile => "env-example",
            Self::CommandLine => "flag",
            Self::Identity => "identity",
        }
    }
}

impl std::fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::PrimaryFile => write!(f, "env file (.env)"),
            Self::FallbackFile => write!(f, "fallback env file (.env.example)"),
            Self::CommandLine => write!(f, "command-line flag"),
            Self::Identity => write!(f, "identity provider"),
        }
    }
}

/// Tracks which layer set each key's value.
pub type FieldSources = HashMap<TelemetryKey, ConfigLayer>;
