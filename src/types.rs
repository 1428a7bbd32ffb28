//! Core data types shared between the device port and the session core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of a recorded track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(u32);

impl TrackId {
    /// Raw numeric value
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Global counter for generating unique track IDs
static NEXT_TRACK_ID: std::sync::atomic::AtomicU32 = std::sync::atomic::AtomicU32::new(1);

/// A finalized recording
///
/// Created when a capture stops successfully and immutable afterwards.
/// The media behind `locator` belongs to the filesystem collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    /// Where the driver stored the captured media (URI or path)
    pub locator: String,
    /// Display name
    pub name: String,
    /// Captured duration in milliseconds
    pub duration_ms: u64,
    /// When the capture was finalized
    pub created_at: DateTime<Utc>,
}

impl Track {
    /// Create a new track with a fresh ID
    pub fn new(locator: impl Into<String>, name: impl Into<String>, duration_ms: u64) -> Self {
        let id = NEXT_TRACK_ID.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Self {
            id: TrackId(id),
            locator: locator.into(),
            name: name.into(),
            duration_ms,
            created_at: Utc::now(),
        }
    }

    /// Name to show, falling back when the track was saved without one
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unknown Track"
        } else {
            &self.name
        }
    }
}

/// Status report delivered by the driver on every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickStatus {
    /// Whether the source is loaded (playback) or the capture is live
    pub loaded: bool,
    /// Elapsed position in milliseconds
    pub position_ms: u64,
    /// Known duration, if the driver has one yet
    pub duration_ms: Option<u64>,
    /// Whether the device is currently producing audio
    pub playing: bool,
    /// Set on the tick that reports end of media
    pub just_finished: bool,
}

impl TickStatus {
    /// A loaded playback tick
    pub fn playback(position_ms: u64, duration_ms: Option<u64>, playing: bool) -> Self {
        Self {
            loaded: true,
            position_ms,
            duration_ms,
            playing,
            just_finished: false,
        }
    }

    /// The end-of-media tick
    pub fn finished(duration_ms: u64) -> Self {
        Self {
            loaded: true,
            position_ms: duration_ms,
            duration_ms: Some(duration_ms),
            playing: false,
            just_finished: true,
        }
    }

    /// A capture tick carrying the elapsed recording time
    pub fn capture(elapsed_ms: u64) -> Self {
        Self {
            loaded: true,
            position_ms: elapsed_ms,
            duration_ms: Some(elapsed_ms),
            playing: false,
            just_finished: false,
        }
    }
}

/// Monotonically increasing tag of a session instance
///
/// Every opened session gets a new generation; callbacks carry the
/// generation they were registered under so late arrivals can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(u64);

impl Generation {
    /// Create a generation with an explicit value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The generation following this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw numeric value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
