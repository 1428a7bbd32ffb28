//! Session manager
//!
//! Owns the single device slot. At most one session (playback or capture)
//! holds a device handle at any time; a new session can only acquire the
//! slot after the previous handle's `release` has completed.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::backend::DeviceHandle;
use crate::error::{ClipError, Result};
use crate::types::Generation;

use super::types::SessionKind;

/// Permission to install a handle, obtained from [`SessionManager::acquire`]
///
/// Dropping a slot without installing it frees the device slot again.
pub struct Slot {
    kind: SessionKind,
    permit: OwnedSemaphorePermit,
}

impl Slot {
    /// Kind of session the slot was acquired for
    pub fn kind(&self) -> SessionKind {
        self.kind
    }
}

struct Lease {
    generation: Generation,
    kind: SessionKind,
    handle: Arc<dyn DeviceHandle>,
    _permit: OwnedSemaphorePermit,
}

/// Arbiter of the device slot
pub struct SessionManager {
    slots: Arc<Semaphore>,
    lease: Mutex<Option<Lease>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    /// Create a manager with a free slot
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Semaphore::new(1)),
            lease: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Lease>> {
        self.lease.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait until the device slot is free and reserve it
    pub async fn acquire(&self, kind: SessionKind) -> Result<Slot> {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ClipError::DeviceUnavailable("session manager shut down".to_string()))?;
        tracing::trace!("Device slot acquired for {}", kind);
        Ok(Slot { kind, permit })
    }

    /// Bind a freshly created handle to the reserved slot
    pub fn install(&self, slot: Slot, generation: Generation, handle: Box<dyn DeviceHandle>) {
        let mut lease = self.lock();
        if let Some(previous) = lease.as_ref() {
            // Unreachable while the semaphore holds a single permit
            tracing::error!(
                "Replacing live {} lease of generation {}",
                previous.kind,
                previous.generation
            );
        }
        *lease = Some(Lease {
            generation,
            kind: slot.kind,
            handle: Arc::from(handle),
            _permit: slot.permit,
        });
        tracing::debug!("Installed {} handle for generation {}", slot.kind, generation);
    }

    /// Handle of the session with the given generation, if it still holds the slot
    pub fn handle(&self, generation: Generation) -> Option<Arc<dyn DeviceHandle>> {
        self.lock()
            .as_ref()
            .filter(|lease| lease.generation == generation)
            .map(|lease| lease.handle.clone())
    }

    /// Generation currently holding the slot
    pub fn active_generation(&self) -> Option<Generation> {
        self.lock().as_ref().map(|lease| lease.generation)
    }

    /// Kind of the session currently holding the slot
    pub fn active_kind(&self) -> Option<SessionKind> {
        self.lock().as_ref().map(|lease| lease.kind)
    }

    /// Whether no session holds the slot
    pub fn is_free(&self) -> bool {
        self.slots.available_permits() > 0
    }

    /// Release the held handle and free the slot
    ///
    /// Returns `Ok(false)` without touching the device when nothing is held.
    /// The slot is freed even when the driver reports a release error.
    pub async fn release(&self) -> Result<bool> {
        let Some(lease) = self.lock().take() else {
            return Ok(false);
        };

        let result = lease.handle.release().await;
        if let Err(e) = &result {
            tracing::warn!(
                "Releasing {} handle of generation {} failed: {}",
                lease.kind,
                lease.generation,
                e
            );
        } else {
            tracing::debug!(
                "Released {} handle of generation {}",
                lease.kind,
                lease.generation
            );
        }
        drop(lease);

        result.map(|_| true)
    }
}
