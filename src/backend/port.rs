//! Device audio port traits
//!
//! This module describes the capability set the session core consumes from
//! the platform audio driver. Real drivers and the simulated device both
//! implement these traits, so the core never depends on a concrete backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::types::TickStatus;

/// Callback invoked by the driver on every status tick
///
/// Drivers may call this from any thread and at any time after the handle
/// was created, including after it was released.
pub type TickCallback = Arc<dyn Fn(TickStatus) + Send + Sync>;

/// How the device behaves when another app wants audio focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterruptionPolicy {
    /// Take exclusive focus
    #[default]
    DoNotMix,
    /// Lower other apps' volume
    DuckOthers,
    /// Play alongside other apps
    MixWithOthers,
}

impl std::fmt::Display for InterruptionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterruptionPolicy::DoNotMix => write!(f, "Do not mix"),
            InterruptionPolicy::DuckOthers => write!(f, "Duck others"),
            InterruptionPolicy::MixWithOthers => write!(f, "Mix with others"),
        }
    }
}

/// Device-wide audio mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMode {
    /// Whether the microphone route is enabled
    pub recording_allowed: bool,
    /// Keep playing when the hardware silent switch is on
    pub silent_mode_playback: bool,
    /// Audio focus behavior
    pub interruption: InterruptionPolicy,
    /// Let the OS lower our volume for notifications
    pub android_ducking: bool,
}

impl AudioMode {
    /// Mode used while a playback session is open
    pub fn playback() -> Self {
        Self {
            recording_allowed: false,
            silent_mode_playback: true,
            interruption: InterruptionPolicy::DoNotMix,
            android_ducking: true,
        }
    }

    /// Mode used while a capture session is open
    pub fn recording() -> Self {
        Self {
            recording_allowed: true,
            ..Self::playback()
        }
    }

    /// Same mode with the microphone route switched off
    pub fn without_recording(self) -> Self {
        Self {
            recording_allowed: false,
            ..self
        }
    }
}

impl Default for AudioMode {
    fn default() -> Self {
        Self::playback()
    }
}

/// Encoder preset for captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    /// 44.1 kHz AAC
    #[default]
    HighQuality,
    /// Low bitrate for voice notes
    LowQuality,
}

impl std::fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityPreset::HighQuality => write!(f, "High quality"),
            QualityPreset::LowQuality => write!(f, "Low quality"),
        }
    }
}

/// Answer to a microphone permission query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionStatus {
    /// Not asked yet
    #[default]
    Undetermined,
    /// User granted access
    Granted,
    /// User refused access
    Denied,
}

impl PermissionStatus {
    /// Whether recording may start
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// An open device resource (loaded source or live capture)
///
/// A handle is owned by exactly one session. `release` must be idempotent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceHandle: Send + Sync {
    /// Start or resume output
    async fn play(&self) -> Result<()>;

    /// Pause output, keeping the position
    async fn pause(&self) -> Result<()>;

    /// Move the playhead
    async fn seek_to(&self, position_ms: u64) -> Result<()>;

    /// Finish a capture, returning the final status
    ///
    /// The returned status carries the authoritative capture duration.
    async fn stop_capture(&self) -> Result<TickStatus>;

    /// Where the media lives (for captures, only known after stop)
    fn locator(&self) -> Option<String>;

    /// Free the native resource
    async fn release(&self) -> Result<()>;
}

/// The driver itself
#[async_trait]
pub trait DevicePort: Send + Sync {
    /// Apply a device-wide audio mode
    async fn configure_mode(&self, mode: AudioMode) -> Result<()>;

    /// Load a source for playback
    async fn load(
        &self,
        locator: &str,
        tick_interval: Duration,
        on_tick: TickCallback,
    ) -> Result<Box<dyn DeviceHandle>>;

    /// Start a capture
    async fn start_capture(
        &self,
        quality: QualityPreset,
        tick_interval: Duration,
        on_tick: TickCallback,
    ) -> Result<Box<dyn DeviceHandle>>;

    /// Current microphone permission
    async fn recording_permission(&self) -> PermissionStatus;

    /// Prompt for microphone permission
    async fn request_recording_permission(&self) -> PermissionStatus;
}
