//! TOML-based configuration persistence for the forwarder.
//!
//! Reads and writes `ForwarderConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\RelayForwarder\config.toml`
//! - Linux:    `~/.config/relay-forwarder/config.toml`
//! - macOS:    `~/Library/Application Support/RelayForwarder/config.toml`
//!
//! Example file:
//!
//! ```toml
//! [forwarder]
//! log_level = "debug"
//!
//! [keyboard]
//! locale = "en-GB"
//! history_enabled = false
//!
//! [pointer]
//! cursor = "crosshair"
//!
//! [network]
//! peer_url = "ws://10.0.0.5:8080/input"
//! ```
//!
//! # Serde default values
//!
//! Every field has a `#[serde(default = "...")]` helper and every section is
//! optional, so a missing file, an empty file, and a file written by an older
//! version all load.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level forwarder configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ForwarderConfig {
    #[serde(default)]
    pub forwarder: GeneralConfig,
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    #[serde(default)]
    pub pointer: PointerConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Schema version string; bump when breaking changes are introduced.
    #[serde(default = "default_version")]
    pub version: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Keyboard and paste settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyboardConfig {
    /// Locale tag of the remote keyboard layout (`"en-US"`, `"en-GB"`).
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Whether forwarded keystrokes are recorded in the history view.
    #[serde(default = "default_true")]
    pub history_enabled: bool,
}

/// Pointer settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointerConfig {
    /// Cursor shown over the remote screen (a CSS cursor name).
    #[serde(default = "default_cursor")]
    pub cursor: String,
    /// Throttle interval before the first round trip is measured.
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,
}

/// Connection to the remote peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// WebSocket URL of the peer's input endpoint.
    #[serde(default = "default_peer_url")]
    pub peer_url: String,
    /// How long to wait for an acknowledgement before failing the request.
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
}

impl PointerConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }
}

impl NetworkConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_version() -> String {
    "1.0".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_locale() -> String {
    "en-US".to_string()
}
fn default_true() -> bool {
    true
}
fn default_cursor() -> String {
    "default".to_string()
}
fn default_initial_interval_ms() -> u64 {
    100
}
fn default_peer_url() -> String {
    "ws://127.0.0.1:8080/input".to_string()
}
fn default_ack_timeout_ms() -> u64 {
    2000
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            log_level: default_log_level(),
        }
    }
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            history_enabled: default_true(),
        }
    }
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            cursor: default_cursor(),
            initial_interval_ms: default_initial_interval_ms(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            peer_url: default_peer_url(),
            ack_timeout_ms: default_ack_timeout_ms(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `ForwarderConfig` from `path`, returning defaults if the file does
/// not exist yet.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<ForwarderConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ForwarderConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
pub fn save_config_to(path: &Path, config: &ForwarderConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the config from the platform default location.
pub fn load_config() -> Result<ForwarderConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("RelayForwarder"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("relay-forwarder"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("RelayForwarder")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
