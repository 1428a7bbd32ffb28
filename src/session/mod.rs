//! Media session core
//!
//! This module governs the single active recording or playback session:
//! its lifecycle, the displayed playhead, and exclusive ownership of the
//! device handle.
//!
//! # Features
//!
//! - Transport state machine with queued play during load
//! - Position tracking that stays stable across seek gestures
//! - Admission control so at most one device handle is ever open
//! - Stale tick detection through session generations
//! - Capture finalization into named tracks

pub mod controller;
pub mod manager;
pub mod recorder;
pub mod tracker;
pub mod transport;
pub mod types;

pub use controller::MediaController;
pub use manager::SessionManager;
pub use recorder::CaptureRecorder;
pub use tracker::{format_time, PositionTracker};
pub use transport::{PauseAction, PlayAction, Transport};
pub use types::{SessionKind, SessionSnapshot, TransportState};
