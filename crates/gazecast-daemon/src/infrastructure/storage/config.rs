//! TOML-based configuration persistence for the daemon.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Gazecast\config.toml`
//! - Linux:    `~/.config/gazecast/config.toml`
//! - macOS:    `~/Library/Application Support/Gazecast/config.toml`
//!
//! Fields annotated with `#[serde(default = "some_fn")]` fall back to the
//! return value of `some_fn()` when absent from the file, so the daemon
//! works on first run (before a config file exists) and when upgrading
//! from an older file that is missing newer fields.

use std::path::PathBuf;

use gazecast_core::protocol::messages::{DEFAULT_HOST, DEFAULT_PORT};
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

/// Top-level daemon configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub stream: StreamSection,
    #[serde(default)]
    pub screen: ScreenSection,
    #[serde(default)]
    pub magic: MagicSection,
    #[serde(default)]
    pub features: FeatureSection,
    #[serde(default)]
    pub sensor: SensorSection,
}

/// General daemon behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonConfig {
    /// `tracing` log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Broadcast server listen settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamSection {
    /// Interface the gaze stream listens on.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port for the gaze stream.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Accept-loop poll interval in milliseconds; bounds shutdown latency.
    #[serde(default = "default_accept_poll_ms")]
    pub accept_poll_ms: u64,
    /// Per-subscriber socket write timeout in milliseconds.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

/// Screen geometry used to scale normalized gaze into pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenSection {
    #[serde(default = "default_screen_width")]
    pub width_px: f64,
    #[serde(default = "default_screen_height")]
    pub height_px: f64,
}

/// Magic-pointing thresholds; the defaults are the canonical tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MagicSection {
    /// Pointer-motion retention window in milliseconds.
    #[serde(default = "default_mouse_memory_ms")]
    pub mouse_memory_ms: u64,
    /// Minimum recent hand motion in pixels before gaze assists.
    #[serde(default = "default_move_threshold")]
    pub move_threshold_px: f64,
    /// Minimum pointer-to-gaze distance in pixels worth warping across.
    #[serde(default = "default_gaze_threshold")]
    pub gaze_threshold_px: f64,
    /// Maximum hand/gaze bearing disagreement in degrees.
    #[serde(default = "default_angle_threshold")]
    pub angle_threshold_deg: f64,
}

/// Initial user-facing toggle states.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FeatureSection {
    /// Whether the gaze broadcast server starts enabled.
    #[serde(default)]
    pub eye_tracking_server: bool,
    /// Whether magic pointing starts enabled.
    #[serde(default)]
    pub magic_pointing: bool,
}

/// Sensor-source selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorSection {
    /// Run against the synthetic frame generator instead of tracker
    /// hardware.
    #[serde(default = "default_true")]
    pub synthetic: bool,
    /// Frame rate of the synthetic generator.
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: f64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_accept_poll_ms() -> u64 {
    500
}
fn default_write_timeout_ms() -> u64 {
    200
}
fn default_screen_width() -> f64 {
    1920.0
}
fn default_screen_height() -> f64 {
    1080.0
}
fn default_mouse_memory_ms() -> u64 {
    200
}
fn default_move_threshold() -> f64 {
    20.0
}
fn default_gaze_threshold() -> f64 {
    250.0
}
fn default_angle_threshold() -> f64 {
    90.0
}
fn default_true() -> bool {
    true
}
fn default_sample_rate() -> f64 {
    90.0
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            accept_poll_ms: default_accept_poll_ms(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

impl Default for ScreenSection {
    fn default() -> Self {
        Self {
            width_px: default_screen_width(),
            height_px: default_screen_height(),
        }
    }
}

impl Default for MagicSection {
    fn default() -> Self {
        Self {
            mouse_memory_ms: default_mouse_memory_ms(),
            move_threshold_px: default_move_threshold(),
            gaze_threshold_px: default_gaze_threshold(),
            angle_threshold_deg: default_angle_threshold(),
        }
    }
}

impl Default for SensorSection {
    fn default() -> Self {
        Self {
            synthetic: default_true(),
            sample_rate_hz: default_sample_rate(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config
/// base directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory
/// cannot be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from disk, returning `AppConfig::default()` if the
/// file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Persists `config` to disk, creating the config directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    let path = config_file_path()?;

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Gazecast"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("gazecast"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Gazecast")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
