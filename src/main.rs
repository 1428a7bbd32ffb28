//! cliptrack - Main Entry Point
//!
//! Headless demo of the media session controller. It records a short clip
//! on the simulated device, reviews it with a seek, and then deletes it,
//! logging every lifecycle change along the way.

use std::time::Duration;

use anyhow::Context;
use cliptrack::{
    config::{self, AppConfig},
    MediaController, SimulatedDevice, TrackLibrary, TransportState,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file name prefix inside the app data directory
const LOG_FILE_PREFIX: &str = "cliptrack.log";

fn init_logging(config: &AppConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let default_filter = config
        .logging
        .filter
        .clone()
        .unwrap_or_else(|| "info,cliptrack=debug".to_string());

    let (file_layer, guard) = if config.logging.file_logging {
        let dir = config::ensure_app_data_dir().context("Failed to prepare log directory")?;
        let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_or_default();
    let _log_guard = init_logging(&config)?;

    tracing::info!("Starting cliptrack demo");

    let device = SimulatedDevice::new().with_realtime_ticks();
    let controller = MediaController::new(device.clone(), config.clone());
    let mut library = TrackLibrary::new(config.recording.name_prefix.clone());

    // Log every published snapshot
    let mut snapshots = controller.subscribe();
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            tracing::debug!(
                "[{}] {} {} / {}",
                snapshot.generation,
                snapshot.state,
                snapshot.position_label(),
                snapshot.duration_label()
            );
        }
    });

    // Record
    controller.start_recording().await?;
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let id = library.add(controller.stop_recording().await?);
    let track = library
        .get(id)
        .cloned()
        .context("Recorded track missing from library")?;
    tracing::info!(
        "Library holds {} track(s); newest is {} ({})",
        library.len(),
        track.display_name(),
        cliptrack::format_time(track.duration_ms)
    );

    // Review with a seek back to the start
    controller.open_playback(&track).await?;
    controller.play().await?;
    tokio::time::sleep(Duration::from_millis(600)).await;

    controller.seek_begin().await?;
    controller.seek_update(250)?;
    controller.seek_end(250).await?;

    let mut watcher = controller.subscribe();
    let finished = tokio::time::timeout(
        Duration::from_millis(track.duration_ms + 2_000),
        watcher.wait_for(|s| s.state == TransportState::Finished),
    )
    .await;
    match finished {
        Ok(Ok(snapshot)) => tracing::info!("Playback finished at {}", snapshot.position_label()),
        _ => tracing::warn!("Playback did not finish in time"),
    }

    // Delete closes the bound session first
    controller.delete_track(&mut library, id).await?;
    controller.close().await?;

    let stats = device.stats();
    tracing::info!(
        "Device: {} load(s), {} capture(s), {} release(s), peak {} open handle(s)",
        stats.loads,
        stats.captures,
        stats.releases,
        stats.peak_open_handles
    );

    Ok(())
}
