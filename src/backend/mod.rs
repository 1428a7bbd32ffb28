//! Backend module for the device audio port
//!
//! The session core talks to the platform audio driver only through the
//! traits in [`port`]. Drivers report progress asynchronously by invoking
//! the [`TickCallback`] they were given when a handle was created.
//!
//! # Components
//!
//! - [`DevicePort`] - Opens playback sources and captures, applies audio modes
//! - [`DeviceHandle`] - One open native resource, owned by one session
//! - [`SimulatedDevice`] - In-process driver for headless runs and tests (feature-gated)

pub mod port;
#[cfg(feature = "simulated-device")]
pub mod sim;

pub use port::{
    AudioMode, DeviceHandle, DevicePort, InterruptionPolicy, PermissionStatus, QualityPreset,
    TickCallback,
};
#[cfg(feature = "simulated-device")]
pub use sim::{DeviceStats, SimulatedDevice};
