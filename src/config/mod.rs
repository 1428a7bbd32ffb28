//! Configuration module for cliptrack
//!
//! This module handles persistent application configuration:
//! - Device audio modes used for playback and capture
//! - Tick intervals requested from the driver
//! - Position tracker tuning for seek settling
//! - Logging output
//!
//! # App Data Location
//!
//! Configuration is stored in the platform-appropriate data directory
//! under `dev.cliptrack.cliptrack`, unless `CLIPTRACK_DATA_DIR` points
//! somewhere else:
//! - **Linux**: `~/.local/share/dev.cliptrack.cliptrack/`
//! - **macOS**: `~/Library/Application Support/dev.cliptrack.cliptrack/`
//! - **Windows**: `%APPDATA%\dev.cliptrack.cliptrack\`
//!
//! # Example
//!
//! ```ignore
//! use cliptrack::config::AppConfig;
//!
//! let mut config = AppConfig::load_or_default();
//! config.playback.tick_interval_ms = 50;
//! config.save()?;
//! ```

use crate::backend::{AudioMode, QualityPreset};
use crate::error::{ClipError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.cliptrack.cliptrack";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "CLIPTRACK_DATA_DIR";

/// Default playback tick interval in milliseconds
pub const DEFAULT_PLAYBACK_TICK_MS: u64 = 100;

/// Default capture tick interval in milliseconds
pub const DEFAULT_RECORDING_TICK_MS: u64 = 200;

/// Default window after a seek target in which a tick confirms the settle
pub const DEFAULT_SETTLE_WINDOW_MS: u64 = 1500;

/// Default number of unconfirming ticks tolerated after a seek ack
pub const DEFAULT_MAX_SETTLE_TICKS: u32 = 5;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        ClipError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            ClipError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the config file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== App Config ====================

/// Persistent application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Playback session settings
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Capture session settings
    #[serde(default)]
    pub recording: RecordingConfig,

    /// Seek settling behavior
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let path = config_path()
            .ok_or_else(|| ClipError::Config("Could not determine config path".to_string()))?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load config, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load config from an explicit file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClipError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;

        toml::from_str(&content)
            .map_err(|e| ClipError::Config(format!("Failed to parse config {:?}: {}", path, e)))
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(CONFIG_FILE))
    }

    /// Save config to an explicit file
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClipError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ClipError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            ClipError::Config(format!("Failed to write config {:?}: {}", path, e))
        })
    }
}

// ==================== Playback Config ====================

/// Settings applied when a playback session opens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Interval between driver status ticks
    #[serde(default = "default_playback_tick_ms")]
    pub tick_interval_ms: u64,

    /// Device mode configured before loading a source
    #[serde(default = "AudioMode::playback")]
    pub audio_mode: AudioMode,
}

fn default_playback_tick_ms() -> u64 {
    DEFAULT_PLAYBACK_TICK_MS
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_PLAYBACK_TICK_MS,
            audio_mode: AudioMode::playback(),
        }
    }
}

impl PlaybackConfig {
    /// Tick interval as a Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

// ==================== Recording Config ====================

/// Settings applied when a capture session opens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Interval between capture status ticks
    #[serde(default = "default_recording_tick_ms")]
    pub tick_interval_ms: u64,

    /// Encoder preset requested from the driver
    #[serde(default)]
    pub quality: QualityPreset,

    /// Prefix for default track names ("Track 1", "Track 2", ...)
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// Device mode configured before capture starts
    #[serde(default = "AudioMode::recording")]
    pub audio_mode: AudioMode,
}

fn default_recording_tick_ms() -> u64 {
    DEFAULT_RECORDING_TICK_MS
}

fn default_name_prefix() -> String {
    "Track".to_string()
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_RECORDING_TICK_MS,
            quality: QualityPreset::default(),
            name_prefix: default_name_prefix(),
            audio_mode: AudioMode::recording(),
        }
    }
}

impl RecordingConfig {
    /// Tick interval as a Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

// ==================== Tracker Config ====================

/// Tuning for how the position tracker confirms a finished seek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// A post-ack tick within `[target, target + window]` confirms the seek
    #[serde(default = "default_settle_window_ms")]
    pub settle_window_ms: u64,

    /// Unconfirming post-ack ticks tolerated before following ticks again
    #[serde(default = "default_max_settle_ticks")]
    pub max_settle_ticks: u32,
}

fn default_settle_window_ms() -> u64 {
    DEFAULT_SETTLE_WINDOW_MS
}

fn default_max_settle_ticks() -> u32 {
    DEFAULT_MAX_SETTLE_TICKS
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            settle_window_ms: DEFAULT_SETTLE_WINDOW_MS,
            max_settle_ticks: DEFAULT_MAX_SETTLE_TICKS,
        }
    }
}

// ==================== Logging Config ====================

/// Log output configuration for the binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Also write a daily rolling log file in the app data directory
    #[serde(default)]
    pub file_logging: bool,

    /// EnvFilter directive used when RUST_LOG is unset
    #[serde(default)]
    pub filter: Option<String>,
}

// ==================== Tests ====================
