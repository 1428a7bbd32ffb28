//! Transport state machine
//!
//! Pure bookkeeping of the session lifecycle. The transport never talks to
//! the device: it validates a command against the current state, tells the
//! caller which device call to make, and applies the result once the call
//! has been acknowledged.
//!
//! ```text
//! Idle | Unloaded  --open-->         Loading
//! Loading          --loaded-->       Ready
//! Loading          --load failed-->  Unloaded
//! Ready | Finished --play-->         Playing
//! Playing          --pause-->        Ready
//! Playing | Ready  --seek begin-->   Seeking --seek end--> Playing | Ready
//! Playing          --finish tick-->  Finished
//! Idle | Unloaded  --record-->       Recording --stop/cancel--> Idle
//! any              --close-->        Unloaded
//! ```
//!
//! A `play` issued while `Loading` is queued and applied on load
//! completion; a `pause` while `Loading` drops the queued intent.

use crate::error::{ClipError, Result};

use super::types::TransportState;

/// What the caller must do to honor a `play` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayAction {
    /// Remembered until the load completes
    Queued,
    /// Start output from the current position
    Start,
    /// Rewind to zero, then start output
    Replay,
}

/// What the caller must do to honor a `pause` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseAction {
    /// A queued play was dropped, nothing to send to the device
    Dequeued,
    /// Pause the device
    Pause,
}

/// Lifecycle state machine for one media session
#[derive(Debug, Clone, Default)]
pub struct Transport {
    state: TransportState,
    pending_play: bool,
}

impl Transport {
    /// Create a transport in `Idle`
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Whether a play issued during loading is waiting
    pub fn pending_play(&self) -> bool {
        self.pending_play
    }

    fn reject(&self, command: &'static str) -> ClipError {
        ClipError::InvalidTransition {
            state: self.state,
            command,
        }
    }

    /// Enter `Loading` for a new source
    pub fn begin_load(&mut self) -> Result<()> {
        if !self.state.is_closed() {
            return Err(self.reject("open"));
        }
        self.state = TransportState::Loading;
        self.pending_play = false;
        Ok(())
    }

    /// The driver loaded the source; returns whether a play was queued
    pub fn load_complete(&mut self) -> Result<bool> {
        if self.state != TransportState::Loading {
            return Err(self.reject("complete load"));
        }
        self.state = TransportState::Ready;
        Ok(std::mem::take(&mut self.pending_play))
    }

    /// The driver failed to load the source
    pub fn load_failed(&mut self) {
        self.state = TransportState::Unloaded;
        self.pending_play = false;
    }

    /// Validate a `play` command
    pub fn request_play(&mut self) -> Result<PlayAction> {
        match self.state {
            TransportState::Loading => {
                self.pending_play = true;
                Ok(PlayAction::Queued)
            }
            TransportState::Ready => Ok(PlayAction::Start),
            TransportState::Finished => Ok(PlayAction::Replay),
            _ => Err(self.reject("play")),
        }
    }

    /// The device acknowledged `play`
    pub fn play_confirmed(&mut self) -> Result<()> {
        match self.state {
            TransportState::Ready | TransportState::Finished => {
                self.state = TransportState::Playing;
                Ok(())
            }
            _ => Err(self.reject("confirm play")),
        }
    }

    /// Validate a `pause` command
    pub fn request_pause(&mut self) -> Result<PauseAction> {
        match self.state {
            TransportState::Loading => {
                self.pending_play = false;
                Ok(PauseAction::Dequeued)
            }
            TransportState::Playing => Ok(PauseAction::Pause),
            _ => Err(self.reject("pause")),
        }
    }

    /// The device acknowledged `pause`
    pub fn pause_confirmed(&mut self) -> Result<()> {
        if self.state != TransportState::Playing {
            return Err(self.reject("confirm pause"));
        }
        self.state = TransportState::Ready;
        Ok(())
    }

    /// Start a seek gesture
    pub fn seek_begin(&mut self) -> Result<()> {
        self.state = match self.state {
            TransportState::Playing => TransportState::Seeking { resume: true },
            TransportState::Ready => TransportState::Seeking { resume: false },
            _ => return Err(self.reject("begin seek")),
        };
        Ok(())
    }

    /// Validate the end of a seek gesture; returns whether to resume playback
    ///
    /// The state stays `Seeking` until [`Self::seek_settled`] or
    /// [`Self::seek_failed`] is called.
    pub fn seek_end(&self) -> Result<bool> {
        match self.state {
            TransportState::Seeking { resume } => Ok(resume),
            _ => Err(self.reject("end seek")),
        }
    }

    /// The device acknowledged the seek (and the resume, if any)
    pub fn seek_settled(&mut self, playing: bool) -> Result<()> {
        if !self.state.is_seeking() {
            return Err(self.reject("settle seek"));
        }
        self.state = if playing {
            TransportState::Playing
        } else {
            TransportState::Ready
        };
        Ok(())
    }

    /// The seek failed; fall back to a paused, loaded state
    pub fn seek_failed(&mut self) {
        if self.state.is_seeking() {
            self.state = TransportState::Ready;
        }
    }

    /// Validate a `stop` command
    pub fn request_stop(&self) -> Result<()> {
        match self.state {
            TransportState::Playing | TransportState::Ready | TransportState::Finished => Ok(()),
            _ => Err(self.reject("stop")),
        }
    }

    /// The device paused and rewound
    pub fn stop_confirmed(&mut self) {
        if self.state.is_loaded() {
            self.state = TransportState::Ready;
        }
    }

    /// The driver reported end of media; returns whether the state changed
    ///
    /// Ignored while seeking: the gesture owns the playhead.
    pub fn finish(&mut self) -> bool {
        match self.state {
            TransportState::Playing | TransportState::Ready => {
                self.state = TransportState::Finished;
                true
            }
            _ => false,
        }
    }

    /// Enter `Recording`
    pub fn begin_recording(&mut self) -> Result<()> {
        if !self.state.is_closed() {
            return Err(self.reject("start recording"));
        }
        self.state = TransportState::Recording;
        self.pending_play = false;
        Ok(())
    }

    /// Validate that a capture can be stopped or cancelled
    pub fn ensure_recording(&self, command: &'static str) -> Result<()> {
        if self.state.is_recording() {
            Ok(())
        } else {
            Err(self.reject(command))
        }
    }

    /// Leave `Recording` once the capture is finalized or cancelled
    pub fn end_recording(&mut self) {
        if self.state.is_recording() {
            self.state = TransportState::Idle;
        }
    }

    /// Close from any state; returns false if already closed
    pub fn close(&mut self) -> bool {
        self.pending_play = false;
        if self.state == TransportState::Unloaded {
            return false;
        }
        self.state = TransportState::Unloaded;
        true
    }
}
