//! Simulated Device Implementation
//!
//! This module provides an in-process audio driver that can be used for
//! headless runs and testing without real audio hardware. It keeps a virtual
//! playhead per handle and reports status ticks either on demand or from a
//! realtime clock.
//!
//! # Features
//!
//! - **Media catalog**: Locators map to known durations; unknown locators fail to load
//! - **Manual clock**: [`SimulatedDevice::advance`] moves time and emits a tick
//! - **Realtime clock**: Optional tokio task ticking at the requested interval
//! - **Fault injection**: Make the next load, capture, play or seek fail
//! - **Held operations**: Keep loads or seeks in flight until released
//! - **Late callbacks**: Deliver ticks to handles that were already released
//! - **Statistics**: Open handle count, peak concurrency, call counters
//!
//! # Example
//!
//! ```ignore
//! use cliptrack::backend::SimulatedDevice;
//!
//! let device = SimulatedDevice::new().with_media("file:///demo.m4a", 5_000);
//!
//! // ... open a playback session through a MediaController ...
//!
//! device.advance(100); // playhead moves, one tick is emitted
//! assert!(device.stats().peak_open_handles <= 1);
//! ```
//!
//! # Enabling
//!
//! The simulated device is compiled with the `simulated-device` feature,
//! which is on by default.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;

use crate::error::{ClipError, Result};
use crate::types::TickStatus;

use super::port::{
    AudioMode, DeviceHandle, DevicePort, PermissionStatus, QualityPreset, TickCallback,
};

/// Statistics for simulated device operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Handles currently open
    pub open_handles: usize,
    /// Highest number of simultaneously open handles observed
    pub peak_open_handles: usize,
    /// Successful loads
    pub loads: usize,
    /// Successful capture starts
    pub captures: usize,
    /// Calls to `release`, including repeated ones
    pub release_calls: usize,
    /// Releases that actually freed a handle
    pub releases: usize,
    /// Acknowledged `play` calls
    pub plays: usize,
    /// Acknowledged `pause` calls
    pub pauses: usize,
    /// Acknowledged seek targets, in order
    pub seeks: Vec<u64>,
}

#[derive(Debug, Default)]
struct Faults {
    load: bool,
    capture: bool,
    play: bool,
    seek: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleKind {
    Playback,
    Capture,
}

#[derive(Debug)]
struct HandleInner {
    position_ms: u64,
    duration_ms: u64,
    playing: bool,
    released: bool,
    stopped: bool,
}

struct SimHandleState {
    seq: usize,
    kind: HandleKind,
    locator: String,
    on_tick: TickCallback,
    inner: Mutex<HandleInner>,
}

impl SimHandleState {
    fn lock(&self) -> MutexGuard<'_, HandleInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn status(&self, inner: &HandleInner) -> TickStatus {
        match self.kind {
            HandleKind::Playback => {
                TickStatus::playback(inner.position_ms, Some(inner.duration_ms), inner.playing)
            }
            HandleKind::Capture => TickStatus::capture(inner.position_ms),
        }
    }
}

struct SimState {
    media: HashMap<String, u64>,
    permission: PermissionStatus,
    grant_on_request: bool,
    modes: Vec<AudioMode>,
    faults: Faults,
    stats: DeviceStats,
    handles: Vec<Arc<SimHandleState>>,
    realtime: bool,
    captures_started: usize,
}

struct SimShared {
    state: Mutex<SimState>,
    loads_open: watch::Sender<bool>,
    seeks_open: watch::Sender<bool>,
}

impl SimShared {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// In-process audio driver
#[derive(Clone)]
pub struct SimulatedDevice {
    shared: Arc<SimShared>,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimulatedDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedDevice")
            .field("stats", &self.stats())
            .finish()
    }
}

impl SimulatedDevice {
    /// Create a device with an empty media catalog and granted permission
    pub fn new() -> Self {
        let (loads_open, _) = watch::channel(true);
        let (seeks_open, _) = watch::channel(true);
        Self {
            shared: Arc::new(SimShared {
                state: Mutex::new(SimState {
                    media: HashMap::new(),
                    permission: PermissionStatus::Granted,
                    grant_on_request: true,
                    modes: Vec::new(),
                    faults: Faults::default(),
                    stats: DeviceStats::default(),
                    handles: Vec::new(),
                    realtime: false,
                    captures_started: 0,
                }),
                loads_open,
                seeks_open,
            }),
        }
    }

    /// Register a loadable source
    pub fn with_media(self, locator: impl Into<String>, duration_ms: u64) -> Self {
        self.add_media(locator, duration_ms);
        self
    }

    /// Drive ticks from a tokio interval instead of manual `advance` calls
    pub fn with_realtime_ticks(self) -> Self {
        self.shared.lock().realtime = true;
        self
    }

    /// Register a loadable source
    pub fn add_media(&self, locator: impl Into<String>, duration_ms: u64) {
        self.shared.lock().media.insert(locator.into(), duration_ms);
    }

    /// Set the current microphone permission
    pub fn set_permission(&self, status: PermissionStatus) {
        self.shared.lock().permission = status;
    }

    /// Whether a permission prompt grants access
    pub fn set_grant_on_request(&self, grant: bool) {
        self.shared.lock().grant_on_request = grant;
    }

    /// Make the next load fail
    pub fn fail_next_load(&self) {
        self.shared.lock().faults.load = true;
    }

    /// Make the next capture start fail
    pub fn fail_next_capture(&self) {
        self.shared.lock().faults.capture = true;
    }

    /// Make the next play call fail
    pub fn fail_next_play(&self) {
        self.shared.lock().faults.play = true;
    }

    /// Make the next seek fail
    pub fn fail_next_seek(&self) {
        self.shared.lock().faults.seek = true;
    }

    /// Keep subsequent loads in flight until [`Self::release_loads`]
    pub fn hold_loads(&self) {
        self.shared.loads_open.send_replace(false);
    }

    /// Let held loads complete
    pub fn release_loads(&self) {
        self.shared.loads_open.send_replace(true);
    }

    /// Keep subsequent seeks in flight until [`Self::release_seeks`]
    pub fn hold_seeks(&self) {
        self.shared.seeks_open.send_replace(false);
    }

    /// Let held seeks complete
    pub fn release_seeks(&self) {
        self.shared.seeks_open.send_replace(true);
    }

    /// Snapshot of the call statistics
    pub fn stats(&self) -> DeviceStats {
        self.shared.lock().stats.clone()
    }

    /// Audio modes applied so far, in order
    pub fn modes(&self) -> Vec<AudioMode> {
        self.shared.lock().modes.clone()
    }

    /// Number of handles ever created
    pub fn handles_created(&self) -> usize {
        self.shared.lock().handles.len()
    }

    /// Sequence number of the newest handle that is still open
    pub fn active_handle(&self) -> Option<usize> {
        self.shared
            .lock()
            .handles
            .iter()
            .rev()
            .find(|h| !h.lock().released)
            .map(|h| h.seq)
    }

    /// Move the clock without emitting a tick
    pub fn elapse(&self, ms: u64) {
        if let Some(handle) = self.live_handle() {
            step(&handle, ms);
        }
    }

    /// Move the clock and emit one tick from the open handle
    ///
    /// Returns false when no handle is open.
    pub fn advance(&self, ms: u64) -> bool {
        let Some(handle) = self.live_handle() else {
            return false;
        };
        let status = step(&handle, ms);
        (handle.on_tick)(status);
        true
    }

    /// Deliver a tick to the open handle's callback
    pub fn emit_tick(&self, status: TickStatus) -> bool {
        let Some(handle) = self.live_handle() else {
            return false;
        };
        (handle.on_tick)(status);
        true
    }

    /// Deliver a tick to any handle ever created, released or not
    ///
    /// Simulates a callback that was queued before the handle went away.
    pub fn emit_tick_to(&self, seq: usize, status: TickStatus) -> bool {
        let handle = self.shared.lock().handles.get(seq).cloned();
        match handle {
            Some(handle) => {
                (handle.on_tick)(status);
                true
            }
            None => false,
        }
    }

    fn live_handle(&self) -> Option<Arc<SimHandleState>> {
        self.shared
            .lock()
            .handles
            .iter()
            .rev()
            .find(|h| !h.lock().released)
            .cloned()
    }

    fn register(
        &self,
        kind: HandleKind,
        locator: String,
        duration_ms: u64,
        tick_interval: Duration,
        on_tick: TickCallback,
    ) -> SimHandle {
        let mut state = self.shared.lock();
        let handle = Arc::new(SimHandleState {
            seq: state.handles.len(),
            kind,
            locator,
            on_tick,
            inner: Mutex::new(HandleInner {
                position_ms: 0,
                duration_ms,
                playing: false,
                released: false,
                stopped: false,
            }),
        });
        state.handles.push(handle.clone());
        state.stats.open_handles += 1;
        state.stats.peak_open_handles = state.stats.peak_open_handles.max(state.stats.open_handles);
        let realtime = state.realtime;
        drop(state);

        if realtime {
            spawn_clock(handle.clone(), tick_interval);
        }

        SimHandle {
            state: handle,
            shared: self.shared.clone(),
        }
    }
}

/// Advance a handle's clock, returning the status to report
fn step(handle: &SimHandleState, ms: u64) -> TickStatus {
    let mut inner = handle.lock();
    match handle.kind {
        HandleKind::Playback => {
            if inner.playing {
                inner.position_ms = (inner.position_ms + ms).min(inner.duration_ms);
                if inner.position_ms >= inner.duration_ms {
                    inner.playing = false;
                    return TickStatus::finished(inner.duration_ms);
                }
            }
        }
        HandleKind::Capture => {
            if !inner.stopped {
                inner.position_ms += ms;
            }
        }
    }
    handle.status(&inner)
}

fn spawn_clock(handle: Arc<SimHandleState>, tick_interval: Duration) {
    let ms = tick_interval.as_millis().max(1) as u64;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_interval);
        interval.tick().await;
        loop {
            interval.tick().await;
            {
                let inner = handle.lock();
                if inner.released || inner.stopped {
                    break;
                }
            }
            let status = step(&handle, ms);
            (handle.on_tick)(status);
        }
    });
}

#[async_trait]
impl DevicePort for SimulatedDevice {
    async fn configure_mode(&self, mode: AudioMode) -> Result<()> {
        self.shared.lock().modes.push(mode);
        Ok(())
    }

    async fn load(
        &self,
        locator: &str,
        tick_interval: Duration,
        on_tick: TickCallback,
    ) -> Result<Box<dyn DeviceHandle>> {
        let mut gate = self.shared.loads_open.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        let duration_ms = {
            let mut state = self.shared.lock();
            if std::mem::take(&mut state.faults.load) {
                return Err(ClipError::DeviceUnavailable(format!(
                    "simulated load failure for {}",
                    locator
                )));
            }
            let duration_ms = *state.media.get(locator).ok_or_else(|| {
                ClipError::DeviceUnavailable(format!("no such media: {}", locator))
            })?;
            state.stats.loads += 1;
            duration_ms
        };

        tracing::debug!("Simulated load of {} ({} ms)", locator, duration_ms);
        let handle = self.register(
            HandleKind::Playback,
            locator.to_string(),
            duration_ms,
            tick_interval,
            on_tick,
        );
        Ok(Box::new(handle))
    }

    async fn start_capture(
        &self,
        quality: QualityPreset,
        tick_interval: Duration,
        on_tick: TickCallback,
    ) -> Result<Box<dyn DeviceHandle>> {
        let locator = {
            let mut state = self.shared.lock();
            if std::mem::take(&mut state.faults.capture) {
                return Err(ClipError::DeviceUnavailable(
                    "simulated capture failure".to_string(),
                ));
            }
            state.stats.captures += 1;
            state.captures_started += 1;
            format!("file:///sim/recording-{}.m4a", state.captures_started)
        };

        tracing::debug!("Simulated capture started ({}) -> {}", quality, locator);
        let handle = self.register(HandleKind::Capture, locator, 0, tick_interval, on_tick);
        Ok(Box::new(handle))
    }

    async fn recording_permission(&self) -> PermissionStatus {
        self.shared.lock().permission
    }

    async fn request_recording_permission(&self) -> PermissionStatus {
        let mut state = self.shared.lock();
        state.permission = if state.grant_on_request {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        state.permission
    }
}

/// Handle returned by [`SimulatedDevice`]
struct SimHandle {
    state: Arc<SimHandleState>,
    shared: Arc<SimShared>,
}

impl SimHandle {
    fn ensure_open(&self, inner: &HandleInner) -> Result<()> {
        if inner.released {
            Err(ClipError::Device(format!(
                "handle {} already released",
                self.state.seq
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DeviceHandle for SimHandle {
    async fn play(&self) -> Result<()> {
        if std::mem::take(&mut self.shared.lock().faults.play) {
            return Err(ClipError::Device("simulated play failure".to_string()));
        }
        {
            let mut inner = self.state.lock();
            self.ensure_open(&inner)?;
            inner.playing = true;
        }
        self.shared.lock().stats.plays += 1;
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        {
            let mut inner = self.state.lock();
            self.ensure_open(&inner)?;
            inner.playing = false;
        }
        self.shared.lock().stats.pauses += 1;
        Ok(())
    }

    async fn seek_to(&self, position_ms: u64) -> Result<()> {
        let mut gate = self.shared.seeks_open.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        if std::mem::take(&mut self.shared.lock().faults.seek) {
            return Err(ClipError::Device("simulated seek failure".to_string()));
        }
        {
            let mut inner = self.state.lock();
            self.ensure_open(&inner)?;
            inner.position_ms = position_ms.min(inner.duration_ms);
        }
        self.shared.lock().stats.seeks.push(position_ms);
        Ok(())
    }

    async fn stop_capture(&self) -> Result<TickStatus> {
        let status = {
            let mut inner = self.state.lock();
            self.ensure_open(&inner)?;
            if self.state.kind != HandleKind::Capture {
                return Err(ClipError::Device("not a capture handle".to_string()));
            }
            inner.stopped = true;
            inner.duration_ms = inner.position_ms;
            self.state.status(&inner)
        };
        let duration_ms = status.duration_ms.unwrap_or(0);
        self.shared
            .lock()
            .media
            .insert(self.state.locator.clone(), duration_ms);
        Ok(status)
    }

    fn locator(&self) -> Option<String> {
        let inner = self.state.lock();
        match self.state.kind {
            HandleKind::Playback => Some(self.state.locator.clone()),
            HandleKind::Capture if inner.stopped => Some(self.state.locator.clone()),
            HandleKind::Capture => None,
        }
    }

    async fn release(&self) -> Result<()> {
        let freed = {
            let mut inner = self.state.lock();
            let freed = !inner.released;
            inner.released = true;
            inner.playing = false;
            freed
        };
        let mut state = self.shared.lock();
        state.stats.release_calls += 1;
        if freed {
            state.stats.releases += 1;
            state.stats.open_handles = state.stats.open_handles.saturating_sub(1);
        }
        Ok(())
    }
}
