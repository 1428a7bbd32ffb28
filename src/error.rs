//! Error handling for cliptrack
//!
//! This module defines the error type shared by the device port, the
//! session core and the configuration layer, plus a Result alias for use
//! throughout the crate.

use thiserror::Error;

use crate::session::TransportState;
use crate::types::Generation;

/// Main error type for cliptrack operations
#[derive(Error, Debug)]
pub enum ClipError {
    /// The driver could not open or start a device resource
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A command was issued in a state that forbids it
    #[error("Invalid transition: cannot {command} while {state}")]
    InvalidTransition {
        state: TransportState,
        command: &'static str,
    },

    /// A tick or acknowledgement arrived for a superseded session
    #[error("Stale callback for session generation {generation}")]
    StaleCallback { generation: Generation },

    /// Recording was requested without a microphone grant
    #[error("Recording permission denied")]
    PermissionDenied,

    /// A driver call on an open handle failed
    #[error("Device error: {0}")]
    Device(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ClipError>,
    },
}

impl ClipError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ClipError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error only reports a discarded stale callback
    pub fn is_stale(&self) -> bool {
        match self {
            ClipError::StaleCallback { .. } => true,
            ClipError::WithContext { source, .. } => source.is_stale(),
            _ => false,
        }
    }

    /// Whether this error is a rejected transport command
    pub fn is_invalid_transition(&self) -> bool {
        match self {
            ClipError::InvalidTransition { .. } => true,
            ClipError::WithContext { source, .. } => source.is_invalid_transition(),
            _ => false,
        }
    }
}

/// Result type alias for cliptrack operations
pub type Result<T> = std::result::Result<T, ClipError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
