//! Position tracker
//!
//! Produces the single `(position, duration)` pair a UI should display,
//! reconciling periodic driver ticks with user seek gestures.
//!
//! # Modes
//!
//! - **Following**: position follows ticks and never moves backwards
//! - **Seeking**: the gesture's pointer value is shown, ticks only refine duration
//! - **Settling**: after a seek ends the target is shown until the driver has
//!   acked the seek and a tick inside `[target, target + settle_window]` arrives.
//!   After a backward jump, ticks at or beyond the pre-seek playhead are
//!   never taken as confirmation. Stop and replay rewind through the same path.
//! - **Resync**: the next tick is taken verbatim (after a failed seek)
//!
//! Position is clamped to the duration once the duration is known.

use crate::config::TrackerConfig;
use crate::types::TickStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Following,
    Seeking,
    Settling {
        target: u64,
        /// Furthest playhead seen before the jump
        origin: u64,
        acked: bool,
        rejected: u32,
    },
    Resync,
}

/// Authoritative display position for a playback session
#[derive(Debug, Clone)]
pub struct PositionTracker {
    position_ms: u64,
    duration_ms: Option<u64>,
    mode: Mode,
    /// Furthest driver position seen since the current gesture began
    anchor_ms: u64,
    config: TrackerConfig,
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl PositionTracker {
    /// Create a tracker at position zero with unknown duration
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            position_ms: 0,
            duration_ms: None,
            mode: Mode::Following,
            anchor_ms: 0,
            config,
        }
    }

    /// Displayed position in milliseconds
    pub fn position(&self) -> u64 {
        self.position_ms
    }

    /// Known duration in milliseconds
    pub fn duration(&self) -> Option<u64> {
        self.duration_ms
    }

    /// Whether a gesture currently owns the position
    pub fn is_seeking(&self) -> bool {
        matches!(self.mode, Mode::Seeking)
    }

    /// Whether a finished seek is waiting for driver confirmation
    pub fn is_settling(&self) -> bool {
        matches!(self.mode, Mode::Settling { .. })
    }

    /// Playhead the driver may still be reporting from before a jump
    fn origin(&self) -> u64 {
        match self.mode {
            Mode::Seeking => self.anchor_ms.max(self.position_ms),
            Mode::Settling { origin, .. } => origin.max(self.position_ms),
            _ => self.position_ms,
        }
    }

    fn settle_at(&mut self, target: u64, origin: u64, acked: bool) {
        self.position_ms = target;
        self.mode = Mode::Settling {
            target,
            origin,
            acked,
            rejected: 0,
        };
    }

    fn clamp(&self, position_ms: u64) -> u64 {
        match self.duration_ms {
            Some(duration) => position_ms.min(duration),
            None => position_ms,
        }
    }

    /// Apply a driver tick; returns whether the displayed pair changed
    pub fn on_tick(&mut self, status: &TickStatus) -> bool {
        if !status.loaded {
            return false;
        }

        let before = (self.position_ms, self.duration_ms);

        if let Some(duration) = status.duration_ms {
            self.duration_ms = Some(duration);
        }

        match self.mode {
            Mode::Seeking => {
                self.anchor_ms = self.anchor_ms.max(status.position_ms);
            }
            Mode::Following => {
                if status.just_finished {
                    self.position_ms = self.duration_ms.unwrap_or(status.position_ms);
                } else {
                    self.position_ms = self.position_ms.max(status.position_ms);
                }
            }
            Mode::Resync => {
                self.position_ms = status.position_ms;
                self.mode = Mode::Following;
            }
            Mode::Settling {
                target,
                origin,
                acked,
                rejected,
            } => {
                if status.just_finished {
                    self.position_ms = self.duration_ms.unwrap_or(status.position_ms);
                    self.mode = Mode::Following;
                } else if !acked {
                    // Pre-ack ticks describe the old playhead
                    self.mode = Mode::Settling {
                        target,
                        origin: origin.max(status.position_ms),
                        acked,
                        rejected,
                    };
                } else {
                    let window_end = target.saturating_add(self.config.settle_window_ms);
                    let from_before_jump = target < origin && status.position_ms >= origin;
                    if !from_before_jump && (target..=window_end).contains(&status.position_ms) {
                        self.position_ms = status.position_ms;
                        self.mode = Mode::Following;
                    } else if rejected + 1 >= self.config.max_settle_ticks {
                        tracing::debug!(
                            "Seek to {} ms never confirmed, following driver at {} ms",
                            target,
                            status.position_ms
                        );
                        self.position_ms = status.position_ms;
                        self.mode = Mode::Following;
                    } else {
                        self.mode = Mode::Settling {
                            target,
                            origin,
                            acked,
                            rejected: rejected + 1,
                        };
                    }
                }
            }
        }

        self.position_ms = self.clamp(self.position_ms);
        before != (self.position_ms, self.duration_ms)
    }

    /// A seek gesture started; freeze tick-driven updates
    pub fn seek_begin(&mut self) {
        self.anchor_ms = self.origin();
        self.mode = Mode::Seeking;
    }

    /// Live pointer value of the gesture
    pub fn seek_preview(&mut self, position_ms: u64) {
        if self.is_seeking() {
            self.position_ms = self.clamp(position_ms);
        }
    }

    /// The gesture ended at `target_ms`; show it immediately
    pub fn seek_end(&mut self, target_ms: u64) {
        let target = self.clamp(target_ms);
        let origin = self.origin();
        self.settle_at(target, origin, false);
    }

    /// The driver acknowledged the seek
    pub fn seek_acked(&mut self) {
        if let Mode::Settling {
            target,
            origin,
            rejected,
            ..
        } = self.mode
        {
            self.mode = Mode::Settling {
                target,
                origin,
                acked: true,
                rejected,
            };
        }
    }

    /// The seek failed; trust the next tick whatever it says
    pub fn seek_failed(&mut self) {
        self.mode = Mode::Resync;
    }

    /// Jump to a position the driver has already acknowledged (stop, replay)
    ///
    /// Ticks still in flight from before the jump are rejected like after a seek.
    pub fn reset(&mut self, position_ms: u64) {
        let target = self.clamp(position_ms);
        let origin = self.origin();
        self.settle_at(target, origin, true);
    }

    /// End of media reached
    pub fn finish(&mut self) {
        if let Some(duration) = self.duration_ms {
            self.position_ms = duration;
        }
        self.mode = Mode::Following;
    }
}

/// Format milliseconds as `minutes:seconds`
///
/// Seconds are zero-padded to two digits, minutes are unbounded and an
/// unknown or zero time renders as `0:00`.
pub fn format_time(millis: u64) -> String {
    let total_seconds = millis / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tick(position_ms: u64) -> TickStatus {
        TickStatus::playback(position_ms, Some(10_000), true)
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(999), "0:00");
        assert_eq!(format_time(5_000), "0:05");
        assert_eq!(format_time(65_000), "1:05");
        assert_eq!(format_time(119_999), "1:59");
        assert_eq!(format_time(600_000), "10:00");
        assert_eq!(format_time(6_000_000), "100:00");
    }

    #[test]
    fn test_follows_ticks_monotonically() {
        let mut tracker = PositionTracker::default();
        assert!(tracker.on_tick(&tick(100)));
        assert_eq!(tracker.duration(), Some(10_000));
        assert!(tracker.on_tick(&tick(200)));
        assert!(!tracker.on_tick(&tick(150)));
        assert_eq!(tracker.position(), 200);
    }

    #[test]
    fn test_unloaded_tick_is_ignored() {
        let mut tracker = PositionTracker::default();
        let status = TickStatus {
            loaded: false,
            position_ms: 500,
            duration_ms: Some(1000),
            ..Default::default()
        };
        assert!(!tracker.on_tick(&status));
        assert_eq!(tracker.duration(), None);
    }

    #[test]
    fn test_duration_refinement() {
        let mut tracker = PositionTracker::default();
        tracker.on_tick(&TickStatus::playback(0, None, false));
        assert_eq!(tracker.duration(), None);
        tracker.on_tick(&TickStatus::playback(0, Some(4_000), false));
        tracker.on_tick(&TickStatus::playback(0, Some(4_100), false));
        assert_eq!(tracker.duration(), Some(4_100));
    }

    #[test]
    fn test_position_clamped_to_duration() {
        let mut tracker = PositionTracker::default();
        tracker.on_tick(&TickStatus::playback(5_000, Some(3_000), true));
        assert_eq!(tracker.position(), 3_000);

        tracker.seek_begin();
        tracker.seek_preview(9_999);
        assert_eq!(tracker.position(), 3_000);
    }

    #[test]
    fn test_seeking_ignores_tick_positions() {
        let mut tracker = PositionTracker::default();
        tracker.on_tick(&tick(4_000));
        tracker.seek_begin();
        tracker.seek_preview(1_000);

        tracker.on_tick(&TickStatus::playback(4_100, Some(12_000), true));
        assert_eq!(tracker.position(), 1_000);
        assert_eq!(tracker.duration(), Some(12_000));
    }

    #[test]
    fn test_stale_tick_after_seek_end_keeps_target() {
        let mut tracker = PositionTracker::default();
        tracker.on_tick(&tick(4_000));
        tracker.seek_begin();
        tracker.seek_end(1_000);
        assert_eq!(tracker.position(), 1_000);

        // Pre-ack ticks describe the old playhead
        tracker.on_tick(&tick(4_100));
        assert_eq!(tracker.position(), 1_000);
        tracker.seek_acked();

        // A late tick from before the seek is still rejected
        tracker.on_tick(&tick(4_200));
        assert_eq!(tracker.position(), 1_000);
        assert!(tracker.is_settling());

        // A fresh tick at or after the target confirms
        tracker.on_tick(&tick(1_100));
        assert_eq!(tracker.position(), 1_100);
        assert!(!tracker.is_settling());
    }

    #[test]
    fn test_backward_seek_then_follow() {
        let mut tracker = PositionTracker::default();
        tracker.on_tick(&tick(8_000));
        tracker.seek_begin();
        tracker.seek_end(2_000);
        tracker.seek_acked();
        tracker.on_tick(&tick(2_000));
        tracker.on_tick(&tick(2_100));
        assert_eq!(tracker.position(), 2_100);
    }

    #[test]
    fn test_settle_gives_up_after_max_ticks() {
        let config = TrackerConfig {
            settle_window_ms: 100,
            max_settle_ticks: 3,
        };
        let mut tracker = PositionTracker::new(config);
        tracker.on_tick(&tick(0));
        tracker.seek_begin();
        tracker.seek_end(5_000);
        tracker.seek_acked();

        tracker.on_tick(&tick(7_000));
        tracker.on_tick(&tick(7_100));
        assert_eq!(tracker.position(), 5_000);
        tracker.on_tick(&tick(7_200));
        assert_eq!(tracker.position(), 7_200);
        assert!(!tracker.is_settling());
    }

    #[test]
    fn test_finish_during_settle() {
        let mut tracker = PositionTracker::default();
        tracker.on_tick(&tick(9_000));
        tracker.seek_begin();
        tracker.seek_end(9_900);
        tracker.on_tick(&TickStatus::finished(10_000));
        assert_eq!(tracker.position(), 10_000);
        assert!(!tracker.is_settling());
    }

    #[test]
    fn test_failed_seek_resyncs() {
        let mut tracker = PositionTracker::default();
        tracker.on_tick(&tick(3_000));
        tracker.seek_begin();
        tracker.seek_end(8_000);
        tracker.seek_failed();
        tracker.on_tick(&tick(3_100));
        assert_eq!(tracker.position(), 3_100);
    }

    #[test]
    fn test_reset_allows_rewind() {
        let mut tracker = PositionTracker::default();
        tracker.on_tick(&tick(6_000));
        tracker.reset(0);
        assert_eq!(tracker.position(), 0);
        tracker.on_tick(&tick(100));
        assert_eq!(tracker.position(), 100);
        assert!(!tracker.is_settling());
    }

    #[test]
    fn test_late_tick_after_reset_is_rejected() {
        let mut tracker = PositionTracker::default();
        tracker.on_tick(&tick(1_000));
        tracker.reset(0);

        // Inside the settle window but from before the rewind
        tracker.on_tick(&tick(1_000));
        assert_eq!(tracker.position(), 0);

        tracker.on_tick(&tick(200));
        assert_eq!(tracker.position(), 200);
        tracker.on_tick(&tick(300));
        assert_eq!(tracker.position(), 300);
    }

    #[test]
    fn test_short_backward_seek_rejects_late_tick() {
        let mut tracker = PositionTracker::default();
        tracker.on_tick(&tick(4_000));
        tracker.seek_begin();
        tracker.seek_end(3_000);
        tracker.seek_acked();

        tracker.on_tick(&tick(4_100));
        assert_eq!(tracker.position(), 3_000);
        assert!(tracker.is_settling());

        tracker.on_tick(&tick(3_100));
        assert_eq!(tracker.position(), 3_100);
        assert!(!tracker.is_settling());
    }

    #[test]
    fn test_preview_does_not_move_origin() {
        let mut tracker = PositionTracker::default();
        tracker.on_tick(&tick(4_000));
        tracker.seek_begin();
        tracker.seek_preview(9_000);
        tracker.seek_preview(3_500);
        tracker.seek_end(3_500);
        tracker.seek_acked();

        tracker.on_tick(&tick(4_000));
        assert_eq!(tracker.position(), 3_500);
        tracker.on_tick(&tick(3_600));
        assert_eq!(tracker.position(), 3_600);
    }

    #[derive(Debug, Clone)]
    enum Event {
        Tick(u64, Option<u64>),
        Begin,
        Preview(u64),
        End(u64),
        Ack,
        Finish,
    }

    fn event() -> impl Strategy<Value = Event> {
        prop_oneof![
            (0u64..20_000, prop::option::of(1u64..15_000)).prop_map(|(p, d)| Event::Tick(p, d)),
            Just(Event::Begin),
            (0u64..20_000).prop_map(Event::Preview),
            (0u64..20_000).prop_map(Event::End),
            Just(Event::Ack),
            Just(Event::Finish),
        ]
    }

    proptest! {
        #[test]
        fn test_position_stays_within_duration(events in prop::collection::vec(event(), 0..64)) {
            let mut tracker = PositionTracker::default();
            for event in events {
                match event {
                    Event::Tick(p, d) => {
                        tracker.on_tick(&TickStatus::playback(p, d, true));
                    }
                    Event::Begin => tracker.seek_begin(),
                    Event::Preview(p) => tracker.seek_preview(p),
                    Event::End(t) => tracker.seek_end(t),
                    Event::Ack => tracker.seek_acked(),
                    Event::Finish => tracker.finish(),
                }

                // Property: once duration is known, position never exceeds it
                if let Some(duration) = tracker.duration() {
                    prop_assert!(tracker.position() <= duration);
                }
            }
        }

        #[test]
        fn test_format_time_shape(millis in 0u64..100_000_000) {
            let formatted = format_time(millis);
            let (minutes, seconds) = formatted.split_once(':').unwrap();
            prop_assert_eq!(seconds.len(), 2);
            prop_assert!(seconds.parse::<u64>().unwrap() < 60);
            prop_assert_eq!(minutes.parse::<u64>().unwrap(), millis / 60_000);
        }
    }
}
