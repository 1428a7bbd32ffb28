//! Media controller
//!
//! The upward interface of the session core. A [`MediaController`] drives
//! one session at a time through the [`Transport`] state machine, issues
//! the matching calls on the device port, and folds asynchronous driver
//! ticks into the [`PositionTracker`].
//!
//! # Concurrency
//!
//! - Transport commands (`play`, `pause`, `seek_*`, `stop`, recording
//!   commands) are serialized by an async command lock, so a seek has been
//!   acknowledged before the next `seek_begin` is accepted.
//! - `open_playback` and `close` do not take the command lock. Every device
//!   result is checked against the session generation it was issued for and
//!   dropped if that session has been closed or replaced in the meantime.
//! - Ticks carry the generation they were registered under; late ticks are
//!   discarded.
//!
//! # Example
//!
//! ```ignore
//! use cliptrack::backend::SimulatedDevice;
//! use cliptrack::config::AppConfig;
//! use cliptrack::session::MediaController;
//!
//! let device = SimulatedDevice::new();
//! let controller = MediaController::new(device.clone(), AppConfig::default());
//!
//! controller.start_recording().await?;
//! device.advance(1_000);
//! let track = controller.stop_recording().await?;
//!
//! controller.open_playback(&track).await?;
//! controller.play().await?;
//! println!("{}", controller.snapshot().position_label());
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::backend::{DeviceHandle, DevicePort, TickCallback};
use crate::config::AppConfig;
use crate::error::{ClipError, Result};
use crate::library::TrackLibrary;
use crate::types::{Generation, TickStatus, Track, TrackId};

use super::manager::SessionManager;
use super::recorder::CaptureRecorder;
use super::tracker::PositionTracker;
use super::transport::{PauseAction, PlayAction, Transport};
use super::types::{SessionKind, SessionSnapshot, TransportState};

// ==================== Session Core ====================

/// Mutable state of the current session, shared with tick callbacks
struct Core {
    generation: Generation,
    kind: Option<SessionKind>,
    track: Option<TrackId>,
    transport: Transport,
    tracker: PositionTracker,
    recorder: CaptureRecorder,
}

impl Core {
    fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation && !self.transport.state().is_closed()
    }

    fn reject(&self, command: &'static str) -> ClipError {
        ClipError::InvalidTransition {
            state: self.transport.state(),
            command,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        let state = self.transport.state();
        let (position_ms, duration_ms) = match self.kind {
            Some(SessionKind::Recording) if state.is_recording() => {
                (0, Some(self.recorder.elapsed()))
            }
            _ => (self.tracker.position(), self.tracker.duration()),
        };

        SessionSnapshot {
            generation: self.generation,
            kind: self.kind,
            track: self.track,
            state,
            position_ms,
            duration_ms,
            is_loading: state == TransportState::Loading,
        }
    }
}

struct Shared {
    core: Mutex<Core>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, core: &Core) {
        let snapshot = core.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    /// Fold a driver tick into the session registered under `generation`
    fn apply_tick(&self, generation: Generation, status: TickStatus) -> Result<bool> {
        let mut core = self.lock();
        if !core.is_current(generation) {
            return Err(ClipError::StaleCallback { generation });
        }

        tracing::trace!(
            "Tick gen={} pos={} dur={:?} playing={} finished={}",
            generation,
            status.position_ms,
            status.duration_ms,
            status.playing,
            status.just_finished
        );

        let changed = match core.kind {
            Some(SessionKind::Recording) => core.recorder.on_tick(&status),
            Some(SessionKind::Playback) => {
                let mut changed = core.tracker.on_tick(&status);
                if status.just_finished && core.transport.finish() {
                    core.tracker.finish();
                    tracing::info!("Playback finished (generation {})", generation);
                    changed = true;
                }
                changed
            }
            None => false,
        };

        self.publish(&core);
        Ok(changed)
    }
}

fn device_unavailable(error: ClipError) -> ClipError {
    match error {
        ClipError::DeviceUnavailable(_) => error,
        other => ClipError::DeviceUnavailable(other.to_string()),
    }
}

// ==================== Media Controller ====================

/// Controller for the single active recording or playback session
pub struct MediaController<P: DevicePort + 'static> {
    port: Arc<P>,
    config: AppConfig,
    manager: SessionManager,
    commands: tokio::sync::Mutex<()>,
    shared: Arc<Shared>,
}

impl<P: DevicePort + 'static> MediaController<P> {
    /// Create a controller that owns the given port
    pub fn new(port: P, config: AppConfig) -> Self {
        Self::with_port(Arc::new(port), config)
    }

    /// Create a controller around a shared port
    pub fn with_port(port: Arc<P>, config: AppConfig) -> Self {
        let core = Core {
            generation: Generation::default(),
            kind: None,
            track: None,
            transport: Transport::new(),
            tracker: PositionTracker::new(config.tracker),
            recorder: CaptureRecorder::new(),
        };
        let (snapshots, _) = watch::channel(core.snapshot());

        Self {
            port,
            config,
            manager: SessionManager::new(),
            commands: tokio::sync::Mutex::new(()),
            shared: Arc::new(Shared {
                core: Mutex::new(core),
                snapshots,
            }),
        }
    }

    /// The device port
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Active configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Receive a new snapshot whenever position, duration or state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    /// Current lifecycle state
    pub fn state(&self) -> TransportState {
        self.shared.lock().transport.state()
    }

    /// Whether the device slot is free
    pub fn is_device_free(&self) -> bool {
        self.manager.is_free()
    }

    fn tick_callback(&self, generation: Generation) -> TickCallback {
        let shared = Arc::downgrade(&self.shared);
        Arc::new(move |status: TickStatus| {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            if let Err(e) = shared.apply_tick(generation, status) {
                tracing::debug!("Discarded tick: {}", e);
            }
        })
    }

    /// Handle of `generation`, or `None` once that session was closed or replaced
    fn current_handle(
        &self,
        generation: Generation,
        command: &'static str,
    ) -> Option<Arc<dyn DeviceHandle>> {
        let handle = self.manager.handle(generation);
        if handle.is_none() {
            tracing::debug!("Skipping {} for closed generation {}", command, generation);
        }
        handle
    }

    // ==================== Playback ====================

    /// Open a playback session for `track`
    ///
    /// An open playback session is closed first. If the session is closed
    /// while the load is in flight, the loaded handle is released and the
    /// call returns `Ok(())` with the state left `Unloaded`.
    pub async fn open_playback(&self, track: &Track) -> Result<()> {
        let state = self.state();
        if state.is_recording() {
            return Err(ClipError::InvalidTransition {
                state,
                command: "open",
            });
        }
        if !state.is_closed() {
            self.close().await?;
        }

        let generation = {
            let mut core = self.shared.lock();
            core.transport.begin_load()?;
            core.generation = core.generation.next();
            core.kind = Some(SessionKind::Playback);
            core.track = Some(track.id);
            core.tracker = PositionTracker::new(self.config.tracker);
            self.shared.publish(&core);
            core.generation
        };
        tracing::info!(
            "Opening {} ({}) as generation {}",
            track.display_name(),
            track.id,
            generation
        );

        let slot = self.manager.acquire(SessionKind::Playback).await?;
        let loaded = async {
            self.port
                .configure_mode(self.config.playback.audio_mode)
                .await?;
            self.port
                .load(
                    &track.locator,
                    self.config.playback.tick_interval(),
                    self.tick_callback(generation),
                )
                .await
        }
        .await;

        let handle = match loaded {
            Ok(handle) => handle,
            Err(e) => {
                let mut core = self.shared.lock();
                if core.generation != generation
                    || core.transport.state() != TransportState::Loading
                {
                    tracing::debug!(
                        "Load for generation {} failed after close: {}",
                        generation,
                        e
                    );
                    return Ok(());
                }
                core.transport.load_failed();
                core.kind = None;
                core.track = None;
                self.shared.publish(&core);
                tracing::warn!("Failed to load {}: {}", track.locator, e);
                return Err(device_unavailable(e));
            }
        };

        // `close` observes either the pending load or the installed lease
        let outcome = {
            let mut core = self.shared.lock();
            if core.generation == generation
                && core.transport.state() == TransportState::Loading
            {
                self.manager.install(slot, generation, handle);
                let queued = core.transport.load_complete()?;
                self.shared.publish(&core);
                Ok(queued)
            } else {
                Err((slot, handle))
            }
        };

        match outcome {
            Ok(queued) => {
                tracing::info!("Loaded {} (generation {})", track.locator, generation);
                if queued {
                    tracing::debug!("Applying play queued during load");
                    self.play_queued(generation).await?;
                }
                Ok(())
            }
            Err((slot, handle)) => {
                tracing::debug!("Discarding load of generation {} after close", generation);
                if let Err(e) = handle.release().await {
                    tracing::warn!("Failed to release discarded handle: {}", e);
                }
                drop(slot);
                Ok(())
            }
        }
    }

    async fn play_queued(&self, generation: Generation) -> Result<()> {
        let _guard = self.commands.lock().await;
        let ready = {
            let core = self.shared.lock();
            core.is_current(generation) && core.transport.state() == TransportState::Ready
        };
        if !ready {
            return Ok(());
        }
        self.start_output(generation, false).await
    }

    /// Start or resume playback
    ///
    /// The state becomes `Playing` once the device acknowledges. Issued while
    /// `Loading`, the intent is queued until the load completes. From
    /// `Finished` playback restarts at zero.
    pub async fn play(&self) -> Result<()> {
        let _guard = self.commands.lock().await;
        let (generation, action) = {
            let mut core = self.shared.lock();
            let action = core.transport.request_play()?;
            self.shared.publish(&core);
            (core.generation, action)
        };

        match action {
            PlayAction::Queued => {
                tracing::debug!("Play queued until load completes");
                Ok(())
            }
            PlayAction::Start => self.start_output(generation, false).await,
            PlayAction::Replay => self.start_output(generation, true).await,
        }
    }

    async fn start_output(&self, generation: Generation, rewind: bool) -> Result<()> {
        let Some(handle) = self.current_handle(generation, "play") else {
            return Ok(());
        };

        if rewind {
            if let Err(e) = handle.seek_to(0).await {
                tracing::warn!("Failed to rewind for replay: {}", e);
                return Err(e);
            }
            let mut core = self.shared.lock();
            if core.is_current(generation) {
                core.tracker.reset(0);
                self.shared.publish(&core);
            }
        }

        let result = handle.play().await;

        let mut core = self.shared.lock();
        if !core.is_current(generation) {
            tracing::debug!("Dropping play ack for closed generation {}", generation);
            return Ok(());
        }
        match result {
            Ok(()) => {
                core.transport.play_confirmed()?;
                self.shared.publish(&core);
                tracing::debug!("Playing (generation {})", generation);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Device rejected play: {}", e);
                Err(e)
            }
        }
    }

    /// Pause playback, or drop a play queued during load
    pub async fn pause(&self) -> Result<()> {
        let _guard = self.commands.lock().await;
        let (generation, action) = {
            let mut core = self.shared.lock();
            let action = core.transport.request_pause()?;
            self.shared.publish(&core);
            (core.generation, action)
        };

        if action == PauseAction::Dequeued {
            tracing::debug!("Queued play cancelled");
            return Ok(());
        }

        let Some(handle) = self.current_handle(generation, "pause") else {
            return Ok(());
        };
        let result = handle.pause().await;

        let mut core = self.shared.lock();
        if !core.is_current(generation) {
            return Ok(());
        }
        match result {
            Ok(()) => {
                // A finish tick may have landed while the pause was in flight
                if core.transport.state().is_playing() {
                    core.transport.pause_confirmed()?;
                }
                self.shared.publish(&core);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Device rejected pause: {}", e);
                Err(e)
            }
        }
    }

    /// Start a seek gesture; tick positions are no longer displayed
    pub async fn seek_begin(&self) -> Result<()> {
        let _guard = self.commands.lock().await;
        let mut core = self.shared.lock();
        core.transport.seek_begin()?;
        core.tracker.seek_begin();
        self.shared.publish(&core);
        tracing::debug!("Seek started at {} ms", core.tracker.position());
        Ok(())
    }

    /// Report the live pointer value of the seek gesture
    pub fn seek_update(&self, position_ms: u64) -> Result<()> {
        let mut core = self.shared.lock();
        if !core.transport.state().is_seeking() {
            return Err(core.reject("update seek"));
        }
        core.tracker.seek_preview(position_ms);
        self.shared.publish(&core);
        Ok(())
    }

    /// Finish the seek gesture at `target_ms`
    ///
    /// The displayed position snaps to the target immediately. Returns after
    /// the device has acknowledged the seek (and the resume, if playback was
    /// running when the gesture began).
    pub async fn seek_end(&self, target_ms: u64) -> Result<()> {
        let _guard = self.commands.lock().await;
        let (generation, resume, target) = {
            let mut core = self.shared.lock();
            let resume = core.transport.seek_end()?;
            core.tracker.seek_end(target_ms);
            self.shared.publish(&core);
            (core.generation, resume, core.tracker.position())
        };
        tracing::debug!("Seeking to {} ms (resume: {})", target, resume);

        let Some(handle) = self.current_handle(generation, "seek") else {
            return Ok(());
        };
        let seeked = handle.seek_to(target).await;
        let resumed = match (&seeked, resume) {
            (Ok(()), true) => handle.play().await,
            _ => Ok(()),
        };
        // A failed seek or resume leaves the session paused
        if resume && (seeked.is_err() || resumed.is_err()) {
            if let Err(e) = handle.pause().await {
                tracing::warn!("Failed to pause after seek error: {}", e);
            }
        }

        let mut core = self.shared.lock();
        if !core.is_current(generation) || !core.transport.state().is_seeking() {
            tracing::debug!("Dropping seek ack for closed generation {}", generation);
            return Ok(());
        }

        if let Err(e) = seeked {
            tracing::warn!("Seek to {} ms failed: {}", target, e);
            core.transport.seek_failed();
            core.tracker.seek_failed();
            self.shared.publish(&core);
            return Err(e);
        }

        core.tracker.seek_acked();
        let result = match resumed {
            Ok(()) => core.transport.seek_settled(resume),
            Err(e) => {
                tracing::warn!("Resume after seek failed: {}", e);
                core.transport.seek_settled(false)?;
                Err(e)
            }
        };
        self.shared.publish(&core);
        result
    }

    /// Pause and rewind to the start
    pub async fn stop(&self) -> Result<()> {
        let _guard = self.commands.lock().await;
        let generation = {
            let core = self.shared.lock();
            core.transport.request_stop()?;
            core.generation
        };

        let Some(handle) = self.current_handle(generation, "stop") else {
            return Ok(());
        };
        let result = async {
            handle.pause().await?;
            handle.seek_to(0).await
        }
        .await;

        let mut core = self.shared.lock();
        if !core.is_current(generation) {
            return Ok(());
        }
        if let Err(e) = result {
            tracing::warn!("Stop failed: {}", e);
            return Err(e);
        }
        core.transport.stop_confirmed();
        core.tracker.reset(0);
        self.shared.publish(&core);
        tracing::debug!("Stopped (generation {})", generation);
        Ok(())
    }

    /// Close the current session and release its device handle
    ///
    /// Idempotent: closing a closed session makes no device call.
    pub async fn close(&self) -> Result<()> {
        let closed = {
            let mut core = self.shared.lock();
            let previous = core.transport.state();
            let changed = core.transport.close();
            if changed {
                core.kind = None;
                core.track = None;
                core.tracker = PositionTracker::new(self.config.tracker);
                core.recorder = CaptureRecorder::new();
                self.shared.publish(&core);
                tracing::info!("Closed session {} (was {})", core.generation, previous);
            }
            previous
        };

        if closed.is_recording() {
            let mode = self.config.recording.audio_mode.without_recording();
            if let Err(e) = self.port.configure_mode(mode).await {
                tracing::warn!("Failed to disable recording mode: {}", e);
            }
        }

        self.manager.release().await.map(|_| ())
    }

    // ==================== Recording ====================

    async fn ensure_permission(&self) -> Result<()> {
        if self.port.recording_permission().await.is_granted() {
            return Ok(());
        }
        tracing::info!("Requesting recording permission");
        if self.port.request_recording_permission().await.is_granted() {
            return Ok(());
        }
        tracing::warn!("Recording permission denied");
        Err(ClipError::PermissionDenied)
    }

    /// Start capturing audio
    ///
    /// An open playback session is closed, and its handle released, before
    /// the capture is requested.
    pub async fn start_recording(&self) -> Result<()> {
        let _guard = self.commands.lock().await;
        self.ensure_permission().await?;

        let state = self.state();
        if state.is_recording() {
            return Err(ClipError::InvalidTransition {
                state,
                command: "start recording",
            });
        }
        if !state.is_closed() {
            self.close().await?;
        }

        let generation = {
            let mut core = self.shared.lock();
            core.transport.begin_recording()?;
            core.generation = core.generation.next();
            core.kind = Some(SessionKind::Recording);
            core.track = None;
            core.recorder = CaptureRecorder::new();
            self.shared.publish(&core);
            core.generation
        };

        let slot = self.manager.acquire(SessionKind::Recording).await?;
        let started = async {
            self.port
                .configure_mode(self.config.recording.audio_mode)
                .await?;
            self.port
                .start_capture(
                    self.config.recording.quality,
                    self.config.recording.tick_interval(),
                    self.tick_callback(generation),
                )
                .await
        }
        .await;

        let handle = match started {
            Ok(handle) => handle,
            Err(e) => {
                drop(slot);
                let mode = self.config.recording.audio_mode.without_recording();
                if let Err(mode_err) = self.port.configure_mode(mode).await {
                    tracing::warn!("Failed to disable recording mode: {}", mode_err);
                }
                let mut core = self.shared.lock();
                if core.generation == generation && core.transport.state().is_recording() {
                    core.transport.end_recording();
                    core.kind = None;
                    self.shared.publish(&core);
                }
                tracing::warn!("Failed to start capture: {}", e);
                return Err(device_unavailable(e));
            }
        };

        let outcome = {
            let core = self.shared.lock();
            if core.generation == generation && core.transport.state().is_recording() {
                self.manager.install(slot, generation, handle);
                Ok(())
            } else {
                Err((slot, handle))
            }
        };

        match outcome {
            Ok(()) => {
                tracing::info!("Recording started (generation {})", generation);
                Ok(())
            }
            Err((slot, handle)) => {
                tracing::debug!("Discarding capture of generation {} after close", generation);
                if let Err(e) = handle.release().await {
                    tracing::warn!("Failed to release discarded capture: {}", e);
                }
                drop(slot);
                Ok(())
            }
        }
    }

    /// Stop the capture and return the finalized track
    ///
    /// The track's duration is taken from the status the driver returns on
    /// stop. The track is unnamed; [`TrackLibrary::add`] assigns the default
    /// name. The session ends in `Idle` on success and on failure.
    pub async fn stop_recording(&self) -> Result<Track> {
        let _guard = self.commands.lock().await;
        let generation = {
            let core = self.shared.lock();
            core.transport.ensure_recording("stop recording")?;
            core.generation
        };
        // A closed capture has no track to return
        let Some(handle) = self.current_handle(generation, "stop recording") else {
            return Err(self.shared.lock().reject("stop recording"));
        };

        let final_status = match handle.stop_capture().await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("Failed to stop capture: {}", e);
                self.end_capture(generation).await?;
                return Err(e);
            }
        };

        let finalized = {
            let mut core = self.shared.lock();
            if core.is_current(generation) {
                core.recorder.on_tick(&final_status);
                core.recorder.finalize(&final_status, handle.locator())
            } else {
                Err(core.reject("stop recording"))
            }
        };

        self.end_capture(generation).await?;
        let track = finalized?;
        tracing::info!("Recorded {} ms at {}", track.duration_ms, track.locator);
        Ok(track)
    }

    /// Stop and discard the capture without producing a track
    pub async fn cancel_recording(&self) -> Result<()> {
        let _guard = self.commands.lock().await;
        let generation = {
            let core = self.shared.lock();
            core.transport.ensure_recording("cancel recording")?;
            core.generation
        };

        if let Some(handle) = self.current_handle(generation, "cancel recording") {
            if let Err(e) = handle.stop_capture().await {
                tracing::warn!("Failed to stop cancelled capture: {}", e);
            }
        }

        self.end_capture(generation).await?;
        tracing::info!("Recording cancelled (generation {})", generation);
        Ok(())
    }

    /// Turn the microphone route off, release the capture and return to `Idle`
    async fn end_capture(&self, generation: Generation) -> Result<()> {
        let mode = self.config.recording.audio_mode.without_recording();
        if let Err(e) = self.port.configure_mode(mode).await {
            tracing::warn!("Failed to disable recording mode: {}", e);
        }

        let released = if self.manager.active_generation() == Some(generation) {
            self.manager.release().await.map(|_| ())
        } else {
            Ok(())
        };

        let mut core = self.shared.lock();
        if core.generation == generation && core.transport.state().is_recording() {
            core.transport.end_recording();
            core.kind = None;
            core.recorder = CaptureRecorder::new();
            self.shared.publish(&core);
        }
        released
    }

    // ==================== Library ====================

    /// Remove a track from the library
    ///
    /// A playback session bound to the track is closed first. Returns the
    /// removed track, or `None` if the library did not contain it.
    pub async fn delete_track(
        &self,
        library: &mut TrackLibrary,
        id: TrackId,
    ) -> Result<Option<Track>> {
        let bound = {
            let core = self.shared.lock();
            core.track == Some(id) && !core.transport.state().is_closed()
        };
        if bound {
            tracing::debug!("Closing session bound to deleted track {}", id);
            self.close().await?;
        }

        let removed = library.remove(id);
        if let Some(track) = &removed {
            tracing::info!("Deleted track {} ({})", track.display_name(), id);
        }
        Ok(removed)
    }
}

#[cfg(all(test, feature = "simulated-device"))]
mod tests {
    use super::*;
    use crate::backend::SimulatedDevice;

    const LOCATOR: &str = "file:///clip.m4a";

    fn controller() -> (SimulatedDevice, MediaController<SimulatedDevice>, Track) {
        let device = SimulatedDevice::new().with_media(LOCATOR, 10_000);
        let controller = MediaController::new(device.clone(), AppConfig::default());
        (device, controller, Track::new(LOCATOR, "Clip", 10_000))
    }

    #[tokio::test]
    async fn test_open_play_pause() {
        let (device, controller, track) = controller();
        controller.open_playback(&track).await.unwrap();
        assert_eq!(controller.state(), TransportState::Ready);
        assert_eq!(controller.snapshot().track, Some(track.id));

        controller.play().await.unwrap();
        assert_eq!(controller.state(), TransportState::Playing);

        device.advance(500);
        assert_eq!(controller.snapshot().position_ms, 500);

        controller.pause().await.unwrap();
        assert_eq!(controller.state(), TransportState::Ready);
    }

    #[tokio::test]
    async fn test_pause_while_idle_is_rejected() {
        let (_device, controller, _track) = controller();
        let err = controller.pause().await.unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(controller.state(), TransportState::Idle);
    }

    #[tokio::test]
    async fn test_seek_update_requires_gesture() {
        let (_device, controller, track) = controller();
        controller.open_playback(&track).await.unwrap();
        assert!(controller.seek_update(100).is_err());

        controller.seek_begin().await.unwrap();
        controller.seek_update(2_500).unwrap();
        assert_eq!(controller.snapshot().position_ms, 2_500);
    }

    #[tokio::test]
    async fn test_play_failure_keeps_state() {
        let (device, controller, track) = controller();
        controller.open_playback(&track).await.unwrap();
        device.fail_next_play();

        assert!(matches!(controller.play().await, Err(ClipError::Device(_))));
        assert_eq!(controller.state(), TransportState::Ready);
    }

    #[tokio::test]
    async fn test_replay_from_finished() {
        let (device, controller, track) = controller();
        controller.open_playback(&track).await.unwrap();
        controller.play().await.unwrap();
        device.advance(20_000);
        assert_eq!(controller.state(), TransportState::Finished);
        assert_eq!(controller.snapshot().position_ms, 10_000);

        controller.play().await.unwrap();
        assert_eq!(controller.state(), TransportState::Playing);
        assert_eq!(controller.snapshot().position_ms, 0);
        assert_eq!(device.stats().seeks, vec![0]);
    }

    #[tokio::test]
    async fn test_commands_for_closed_generation_are_dropped() {
        let (device, controller, track) = controller();
        controller.open_playback(&track).await.unwrap();
        let generation = controller.snapshot().generation;
        controller.close().await.unwrap();

        // A command that passed its state check just before the close
        controller.start_output(generation, false).await.unwrap();
        assert_eq!(device.stats().plays, 0);
        assert!(controller.current_handle(generation, "pause").is_none());
        assert_eq!(controller.state(), TransportState::Unloaded);
    }
}
