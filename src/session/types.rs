//! Session data types

use std::fmt;

use crate::types::{Generation, TrackId};

use super::tracker::format_time;

/// Lifecycle state of the media session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    /// No session has been opened yet
    #[default]
    Idle,
    /// Waiting for the driver to load a source
    Loading,
    /// Source loaded, output paused
    Ready,
    /// Output running
    Playing,
    /// A seek gesture is in progress
    Seeking {
        /// Whether playback resumes when the seek ends
        resume: bool,
    },
    /// Reached end of media
    Finished,
    /// Capturing audio
    Recording,
    /// Session closed, handle released
    Unloaded,
}

impl TransportState {
    /// Check if output is running
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }

    /// Check if a seek gesture is in progress
    pub fn is_seeking(&self) -> bool {
        matches!(self, TransportState::Seeking { .. })
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        matches!(self, TransportState::Recording)
    }

    /// Check if a source is loaded and controllable
    pub fn is_loaded(&self) -> bool {
        matches!(
            self,
            TransportState::Ready
                | TransportState::Playing
                | TransportState::Seeking { .. }
                | TransportState::Finished
        )
    }

    /// Check if no device resource is associated with this state
    pub fn is_closed(&self) -> bool {
        matches!(self, TransportState::Idle | TransportState::Unloaded)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            TransportState::Idle => "Idle",
            TransportState::Loading => "Loading",
            TransportState::Ready => "Ready",
            TransportState::Playing => "Playing",
            TransportState::Seeking { .. } => "Seeking",
            TransportState::Finished => "Finished",
            TransportState::Recording => "Recording",
            TransportState::Unloaded => "Unloaded",
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// What a session uses the device for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Playback,
    Recording,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Playback => write!(f, "playback"),
            SessionKind::Recording => write!(f, "recording"),
        }
    }
}

/// Everything a UI needs to render the current session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    /// Generation of the session this snapshot describes
    pub generation: Generation,
    /// Kind of the open session, if any
    pub kind: Option<SessionKind>,
    /// Track bound to a playback session
    pub track: Option<TrackId>,
    /// Lifecycle state
    pub state: TransportState,
    /// Displayed position in milliseconds
    pub position_ms: u64,
    /// Known duration (elapsed capture time while recording)
    pub duration_ms: Option<u64>,
    /// Whether a load is in flight
    pub is_loading: bool,
}

impl SessionSnapshot {
    /// Position rendered as `m:ss`
    pub fn position_label(&self) -> String {
        format_time(self.position_ms)
    }

    /// Duration rendered as `m:ss`
    pub fn duration_label(&self) -> String {
        format_time(self.duration_ms.unwrap_or(0))
    }

    /// Playback progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        match self.duration_ms {
            Some(duration) if duration > 0 => self.position_ms as f64 / duration as f64,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_state_flags() {
        assert!(TransportState::Playing.is_playing());
        assert!(TransportState::Seeking { resume: true }.is_seeking());
        assert!(TransportState::Recording.is_recording());
        assert!(TransportState::Finished.is_loaded());
        assert!(!TransportState::Loading.is_loaded());
        assert!(TransportState::Unloaded.is_closed());
        assert_eq!(TransportState::Seeking { resume: false }.to_string(), "Seeking");
    }

    #[test]
    fn test_snapshot_labels() {
        let snapshot = SessionSnapshot {
            position_ms: 65_000,
            duration_ms: Some(130_000),
            ..Default::default()
        };
        assert_eq!(snapshot.position_label(), "1:05");
        assert_eq!(snapshot.duration_label(), "2:10");
        assert!((snapshot.progress() - 0.5).abs() < f64::EPSILON);

        let unknown = SessionSnapshot::default();
        assert_eq!(unknown.duration_label(), "0:00");
        assert_eq!(unknown.progress(), 0.0);
    }
}
