//! Capture bookkeeping for recording sessions

use crate::error::{ClipError, Result};
use crate::types::{TickStatus, Track};

/// Tracks a live capture and turns it into a [`Track`] when it stops
#[derive(Debug, Clone, Default)]
pub struct CaptureRecorder {
    /// Elapsed capture time from the latest tick
    elapsed_ms: u64,
    /// Number of capture ticks seen
    ticks: usize,
}

impl CaptureRecorder {
    /// Create a recorder for a new capture
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed capture time reported by the latest tick
    pub fn elapsed(&self) -> u64 {
        self.elapsed_ms
    }

    /// Number of ticks received
    pub fn tick_count(&self) -> usize {
        self.ticks
    }

    /// Apply a capture tick; returns whether the elapsed time changed
    pub fn on_tick(&mut self, status: &TickStatus) -> bool {
        if !status.loaded {
            return false;
        }
        self.ticks += 1;
        let elapsed = status.duration_ms.unwrap_or(status.position_ms);
        if elapsed == self.elapsed_ms {
            return false;
        }
        self.elapsed_ms = elapsed;
        true
    }

    /// Build the finalized, still unnamed track from the driver's final status
    ///
    /// The duration comes from `final_status`, which the driver produces when
    /// the capture stops, not from the last periodic tick.
    pub fn finalize(&self, final_status: &TickStatus, locator: Option<String>) -> Result<Track> {
        let locator = locator.ok_or_else(|| {
            ClipError::Device("capture stopped without a media locator".to_string())
        })?;
        let duration_ms = final_status
            .duration_ms
            .unwrap_or(final_status.position_ms.max(self.elapsed_ms));
        Ok(Track::new(locator, "", duration_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_follows_ticks() {
        let mut recorder = CaptureRecorder::new();
        assert!(recorder.on_tick(&TickStatus::capture(200)));
        assert!(recorder.on_tick(&TickStatus::capture(400)));
        assert!(!recorder.on_tick(&TickStatus::capture(400)));
        assert_eq!(recorder.elapsed(), 400);
        assert_eq!(recorder.tick_count(), 3);
    }

    #[test]
    fn test_final_status_wins_over_last_tick() {
        let mut recorder = CaptureRecorder::new();
        recorder.on_tick(&TickStatus::capture(1_000));

        let track = recorder
            .finalize(&TickStatus::capture(1_180), Some("file:///rec.m4a".to_string()))
            .unwrap();
        assert_eq!(track.duration_ms, 1_180);
        assert_eq!(track.locator, "file:///rec.m4a");
        assert!(track.name.is_empty());
    }

    #[test]
    fn test_missing_locator_is_an_error() {
        let recorder = CaptureRecorder::new();
        let result = recorder.finalize(&TickStatus::capture(10), None);
        assert!(matches!(result, Err(ClipError::Device(_))));
    }
}
