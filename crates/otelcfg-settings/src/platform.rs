//! Platform detection and settings directory resolution.
//!
//! Detection works from a [`HostProbe`], a snapshot of the facts that decide
//! the platform: OS identifier, environment variables and the kernel release
//! string. Tests build probes by hand; the binary uses [`HostProbe::current`].
//!
//! # Layout
//!
//! ```text
//! Linux, WSL   $XDG_CONFIG_HOME/claude-code/managed-settings.json
//!              (or $HOME/.config/claude-code/managed-settings.json)
//! macOS        $HOME/Library/Application Support/ClaudeCode/managed-settings.json
//! Windows      %APPDATA%\claude-code\managed-settings.json
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{SettingsError, SettingsResult};

/// Directory name under the XDG config home and `%APPDATA%`.
pub const SETTINGS_DIR_NAME: &str = "claude-code";

/// Path under the macOS home directory.
pub const MACOS_SETTINGS_DIR: &str = "Library/Application Support/ClaudeCode";

/// Settings file name inside the settings directory.
pub const SETTINGS_FILE_NAME: &str = "managed-settings.json";

/// Kernel release file on Linux.
const KERNEL_RELEASE_PATH: &str = "/proc/sys/kernel/osrelease";

/// Environment variables set inside WSL sessions.
const WSL_ENV_MARKERS: &[&str] = &["WSL_DISTRO_NAME", "WSL_INTEROP"];

// ---------------------------------------------------------------------------
// HostProbe
// ---------------------------------------------------------------------------

/// Snapshot of the host facts used for platform detection.
#[derive(Debug, Clone, Default)]
pub struct HostProbe {
    /// OS identifier in `std::env::consts::OS` form (`linux`, `macos`, ...).
    pub os: String,
    /// Environment variables.
    pub env: HashMap<String, String>,
    /// Kernel release string, when the host exposes one.
    pub kernel_release: Option<String>,
}

impl HostProbe {
    /// Probe the running host.
    #[must_use]
    pub fn current() -> Self {
        let env = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();

        let kernel_release = std::fs::read_to_string(KERNEL_RELEASE_PATH)
            .ok()
            .map(|s| s.trim().to_owned());

        Self {
            os: std::env::consts::OS.to_owned(),
            env,
            kernel_release,
        }
    }

    /// Build a probe for `os` with no environment.
    #[must_use]
    pub fn new(os: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            ..Self::default()
        }
    }

    /// Add an environment variable.
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Set the kernel release string.
    #[must_use]
    pub fn with_kernel_release(mut self, release: impl Into<String>) -> Self {
        self.kernel_release = Some(release.into());
        self
    }

    /// Non-empty value of an environment variable.
    #[must_use]
    pub fn var(&self, name: &str) -> Option<&str> {
        self.env
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn require_var(&self, name: &str) -> SettingsResult<&str> {
        self.var(name).ok_or_else(|| SettingsError::MissingEnv {
            var: name.to_owned(),
        })
    }

    /// The user's home directory: `$HOME`, else the OS account database.
    fn home_dir(&self) -> SettingsResult<PathBuf> {
        if let Some(home) = self.var("HOME") {
            return Ok(PathBuf::from(home));
        }
        directories::BaseDirs::new()
            .map(|d| d.home_dir().to_path_buf())
            .ok_or_else(|| SettingsError::MissingEnv {
                var: "HOME".to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// Operating system family, as far as settings placement is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux.
    Linux,
    /// Linux running under the Windows Subsystem for Linux.
    Wsl,
    /// macOS.
    MacOs,
    /// Windows.
    Windows,
}

impl Platform {
    /// Detect the platform from a probe.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnsupportedPlatform`] for any OS other than
    /// Linux, macOS and Windows.
    pub fn detect(probe: &HostProbe) -> SettingsResult<Self> {
        let platform = match probe.os.as_str() {
            "linux" if is_wsl(probe) => Self::Wsl,
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            "windows" => Self::Windows,
            other => {
                return Err(SettingsError::UnsupportedPlatform {
                    os: other.to_owned(),
                });
            },
        };
        debug!(os = %probe.os, platform = %platform, "detected platform");
        Ok(platform)
    }

    /// The canonical settings directory for this platform.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingEnv`] if a variable the platform's
    /// rule depends on is unset.
    pub fn settings_dir(self, probe: &HostProbe) -> SettingsResult<PathBuf> {
        match self {
            Self::Linux | Self::Wsl => {
                let base = probe
                    .var("XDG_CONFIG_HOME")
                    .map(PathBuf::from)
                    .filter(|p| p.is_absolute());
                let base = match base {
                    Some(b) => b,
                    None => probe.home_dir()?.join(".config"),
                };
                Ok(base.join(SETTINGS_DIR_NAME))
            },
            Self::MacOs => Ok(probe.home_dir()?.join(MACOS_SETTINGS_DIR)),
            Self::Windows => Ok(Path::new(probe.require_var("APPDATA")?).join(SETTINGS_DIR_NAME)),
        }
    }

    /// The settings file path for this platform.
    ///
    /// # Errors
    ///
    /// See [`Platform::settings_dir`].
    pub fn settings_path(self, probe: &HostProbe) -> SettingsResult<PathBuf> {
        Ok(self.settings_dir(probe)?.join(SETTINGS_FILE_NAME))
    }

    /// Note for the operator about which shell environment will read the
    /// settings consistently, for platforms where that is ambiguous.
    #[must_use]
    pub const fn advisory(self) -> Option<&'static str> {
        match self {
            Self::Wsl => Some(
                "WSL detected: settings were written inside the Linux filesystem. \
                 Run the tool from this WSL distribution; a native Windows install \
                 reads %APPDATA% instead.",
            ),
            Self::Windows => Some(
                "Windows detected: settings were written under %APPDATA%. \
                 Run the tool as the same Windows user; WSL shells use a separate \
                 Linux home directory.",
            ),
            Self::Linux | Self::MacOs => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Wsl => write!(f, "wsl"),
            Self::MacOs => write!(f, "macos"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

fn is_wsl(probe: &HostProbe) -> bool {
    if WSL_ENV_MARKERS.iter().any(|m| probe.var(m).is_some()) {
        return true;
    }
    probe.kernel_release.as_deref().is_some_and(|release| {
        let release = release.to_ascii_lowercase();
        release.contains("microsoft") || release.contains("wsl")
    })
}
