//! # cliptrack: Audio Clip Session Controller
//!
//! Records short audio clips, keeps them as named tracks, and plays them
//! back with seek control. The core is a media session controller that
//! sequences asynchronous device driver calls and status ticks against user
//! transport commands.
//!
//! ## Architecture
//!
//! - **Backend**: The device audio port traits and a simulated driver
//! - **Session**: Transport state machine, position tracker, session manager
//! - **Library**: In-memory collection of recorded tracks
//! - **Communication**: Snapshots published on a tokio watch channel
//!
//! ## Configuration
//!
//! Settings are stored in the platform-appropriate data directory under
//! `dev.cliptrack.cliptrack` (see [`config`]).
//!
//! ## Example
//!
//! ```ignore
//! use cliptrack::{AppConfig, MediaController, SimulatedDevice, TrackLibrary};
//!
//! #[tokio::main]
//! async fn main() -> cliptrack::Result<()> {
//!     let device = SimulatedDevice::new().with_realtime_ticks();
//!     let controller = MediaController::new(device, AppConfig::load_or_default());
//!     let mut library = TrackLibrary::default();
//!
//!     controller.start_recording().await?;
//!     tokio::time::sleep(std::time::Duration::from_secs(2)).await;
//!     let id = library.add(controller.stop_recording().await?);
//!
//!     if let Some(track) = library.get(id) {
//!         controller.open_playback(track).await?;
//!         controller.play().await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod library;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use backend::{AudioMode, DeviceHandle, DevicePort, PermissionStatus, QualityPreset};
#[cfg(feature = "simulated-device")]
pub use backend::{DeviceStats, SimulatedDevice};
pub use config::AppConfig;
pub use error::{ClipError, Result};
pub use library::TrackLibrary;
pub use session::{format_time, MediaController, SessionSnapshot, TransportState};
pub use types::{Generation, TickStatus, Track, TrackId};
