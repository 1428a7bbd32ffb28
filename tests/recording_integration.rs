//! Integration tests for recording sessions
//!
//! These tests validate the capture workflow end to end:
//! - Handoff from playback to recording
//! - Track finalization from the driver's final status
//! - Permission prompts and capture failures
//! - Track deletion while a session is bound to it

#![cfg(feature = "simulated-device")]

mod common;

use cliptrack::{
    AudioMode, ClipError, PermissionStatus, TickStatus, TrackLibrary, TransportState,
};
use common::builders::TrackBuilder;
use common::mock_helpers::create_test_controller;

#[tokio::test]
async fn test_record_and_finalize_track() {
    let (device, controller) = create_test_controller(&[]);

    controller.start_recording().await.unwrap();
    assert_eq!(controller.state(), TransportState::Recording);

    device.advance(200);
    device.advance(200);
    device.advance(200);
    assert_eq!(controller.snapshot().duration_ms, Some(600));
    assert_eq!(controller.snapshot().duration_label(), "0:00");

    // Captured after the last periodic tick
    device.elapse(150);
    let track = controller.stop_recording().await.unwrap();

    assert_eq!(track.duration_ms, 750);
    assert!(track.name.is_empty());
    assert_eq!(track.locator, "file:///sim/recording-1.m4a");
    assert_eq!(controller.state(), TransportState::Idle);
    assert!(controller.is_device_free());
    assert_eq!(device.stats().open_handles, 0);
}

#[tokio::test]
async fn test_library_names_recordings() {
    let (device, controller) = create_test_controller(&[]);
    let mut library = TrackLibrary::default();

    controller.start_recording().await.unwrap();
    device.advance(100);
    let first = library.add(controller.stop_recording().await.unwrap());

    controller.start_recording().await.unwrap();
    device.advance(100);
    let second = library.add(controller.stop_recording().await.unwrap());

    assert_ne!(first, second);
    assert_eq!(library.get(first).unwrap().name, "Track 1");
    assert_eq!(library.get(second).unwrap().name, "Track 2");

    // Names follow the library, not the number of captures
    controller.delete_track(&mut library, first).await.unwrap();
    controller.start_recording().await.unwrap();
    device.advance(100);
    let third = library.add(controller.stop_recording().await.unwrap());
    assert_eq!(library.get(third).unwrap().name, "Track 2");
}

#[tokio::test]
async fn test_recording_switches_audio_modes() {
    let (device, controller) = create_test_controller(&[]);

    controller.start_recording().await.unwrap();
    device.advance(100);
    controller.stop_recording().await.unwrap();

    let modes = device.modes();
    assert_eq!(modes.first(), Some(&AudioMode::recording()));
    assert!(!modes.last().unwrap().recording_allowed);
}

#[tokio::test]
async fn test_recording_releases_playback_first() {
    let track = TrackBuilder::new("Clip").build();
    let (device, controller) = create_test_controller(&[&track]);

    controller.open_playback(&track).await.unwrap();
    controller.play().await.unwrap();
    device.advance(500);

    controller.start_recording().await.unwrap();
    assert_eq!(controller.state(), TransportState::Recording);

    let stats = device.stats();
    assert_eq!(stats.peak_open_handles, 1);
    assert_eq!(stats.releases, 1);
    assert_eq!(stats.open_handles, 1);
    assert_eq!(device.handles_created(), 2);
}

#[tokio::test]
async fn test_review_recording_immediately() {
    let (device, controller) = create_test_controller(&[]);

    controller.start_recording().await.unwrap();
    device.advance(200);
    device.elapse(100);
    let track = controller.stop_recording().await.unwrap();

    controller.open_playback(&track).await.unwrap();
    device.advance(0);
    assert_eq!(controller.snapshot().duration_ms, Some(300));
    assert_eq!(device.stats().peak_open_handles, 1);
}

#[tokio::test]
async fn test_late_capture_tick_is_discarded() {
    let (device, controller) = create_test_controller(&[]);

    controller.start_recording().await.unwrap();
    let seq = device.active_handle().unwrap();
    device.advance(200);
    controller.stop_recording().await.unwrap();

    device.emit_tick_to(seq, TickStatus::capture(5_000));
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, TransportState::Idle);
    assert_eq!(snapshot.duration_ms, None);
}

#[tokio::test]
async fn test_permission_requested_once() {
    let (device, controller) = create_test_controller(&[]);
    device.set_permission(PermissionStatus::Undetermined);
    device.set_grant_on_request(true);

    controller.start_recording().await.unwrap();
    assert_eq!(controller.state(), TransportState::Recording);
}

#[tokio::test]
async fn test_permission_denied_changes_nothing() {
    let track = TrackBuilder::new("Clip").build();
    let (device, controller) = create_test_controller(&[&track]);
    controller.open_playback(&track).await.unwrap();

    device.set_permission(PermissionStatus::Denied);
    device.set_grant_on_request(false);

    let err = controller.start_recording().await.unwrap_err();
    assert!(matches!(err, ClipError::PermissionDenied));
    assert_eq!(controller.state(), TransportState::Ready);

    let stats = device.stats();
    assert_eq!(stats.captures, 0);
    assert_eq!(stats.releases, 0);
}

#[tokio::test]
async fn test_capture_failure_returns_to_idle() {
    let (device, controller) = create_test_controller(&[]);
    device.fail_next_capture();

    let err = controller.start_recording().await.unwrap_err();
    assert!(matches!(err, ClipError::DeviceUnavailable(_)));
    assert_eq!(controller.state(), TransportState::Idle);
    assert!(controller.is_device_free());
    assert!(!device.modes().last().unwrap().recording_allowed);

    controller.start_recording().await.unwrap();
    assert_eq!(controller.state(), TransportState::Recording);
}

#[tokio::test]
async fn test_cancel_recording() {
    let (device, controller) = create_test_controller(&[]);

    controller.start_recording().await.unwrap();
    device.advance(400);
    controller.cancel_recording().await.unwrap();

    assert_eq!(controller.state(), TransportState::Idle);
    assert!(controller.is_device_free());
    assert_eq!(device.stats().releases, 1);
}

#[tokio::test]
async fn test_recording_commands_require_capture() {
    let (_device, controller) = create_test_controller(&[]);

    assert!(controller.stop_recording().await.unwrap_err().is_invalid_transition());
    assert!(controller.cancel_recording().await.unwrap_err().is_invalid_transition());

    controller.start_recording().await.unwrap();
    assert!(controller.start_recording().await.unwrap_err().is_invalid_transition());
    assert!(controller.play().await.unwrap_err().is_invalid_transition());
}

#[tokio::test]
async fn test_close_during_recording() {
    let (device, controller) = create_test_controller(&[]);

    controller.start_recording().await.unwrap();
    controller.close().await.unwrap();

    assert_eq!(controller.state(), TransportState::Unloaded);
    assert!(controller.is_device_free());
    assert!(!device.modes().last().unwrap().recording_allowed);
}

#[tokio::test]
async fn test_delete_bound_track_closes_session() {
    let (device, controller) = create_test_controller(&[]);
    let mut library = TrackLibrary::default();

    controller.start_recording().await.unwrap();
    device.advance(200);
    let id = library.add(controller.stop_recording().await.unwrap());
    let track = library.get(id).cloned().unwrap();

    controller.open_playback(&track).await.unwrap();
    let removed = controller.delete_track(&mut library, id).await.unwrap();

    assert_eq!(removed.map(|t| t.id), Some(id));
    assert!(library.is_empty());
    assert_eq!(controller.state(), TransportState::Unloaded);
    assert!(controller.is_device_free());
}

#[tokio::test]
async fn test_delete_other_track_keeps_session() {
    let playing = TrackBuilder::new("Playing").build();
    let other = TrackBuilder::new("Other").build();
    let (_device, controller) = create_test_controller(&[&playing]);
    let mut library = TrackLibrary::default();
    library.add(playing.clone());
    let other_id = library.add(other);

    controller.open_playback(&playing).await.unwrap();
    controller.delete_track(&mut library, other_id).await.unwrap();

    assert_eq!(library.len(), 1);
    assert_eq!(controller.state(), TransportState::Ready);
    assert!(controller
        .delete_track(&mut library, other_id)
        .await
        .unwrap()
        .is_none());
}
