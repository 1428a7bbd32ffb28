//! Simulated device construction helpers

#[cfg(feature = "simulated-device")]
use cliptrack::{AppConfig, MediaController, SimulatedDevice, Track};

/// Create a simulated device that can load `tracks`
#[cfg(feature = "simulated-device")]
pub fn create_test_device(tracks: &[&Track]) -> SimulatedDevice {
    let device = SimulatedDevice::new();
    for track in tracks {
        device.add_media(track.locator.clone(), track.duration_ms);
    }
    device
}

/// Create a controller sharing state with the returned device
#[cfg(feature = "simulated-device")]
pub fn create_test_controller(
    tracks: &[&Track],
) -> (SimulatedDevice, MediaController<SimulatedDevice>) {
    let device = create_test_device(tracks);
    let controller = MediaController::new(device.clone(), AppConfig::default());
    (device, controller)
}
