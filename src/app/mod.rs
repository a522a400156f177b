//! Application Wiring
//!
//! Builds the one `EngineState`, binds the transports, spawns the
//! listener and scheduler tasks and runs until a shutdown signal.
//! Only the local socket bind is allowed to abort startup; the optional
//! transports degrade to a logged error.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::audio::CommandAudioSink;
use crate::config::Settings;
use crate::display::HeadlessPresenter;
use crate::engine::EngineState;
use crate::scheduler::DisplayScheduler;
use crate::{transport, web};

/// Run the daemon until ctrl-c. Listener loops stop immediately on
/// shutdown; an animation already in flight unwinds before exit.
pub async fn run(settings: Settings) -> Result<()> {
    let engine = Arc::new(EngineState::new());
    let shutdown = CancellationToken::new();

    // the primary contract is local delivery; failure to bind is fatal
    let local_listener = transport::unix::bind(&settings.socket_path).with_context(|| {
        format!(
            "failed to bind local socket at {}",
            settings.socket_path.display()
        )
    })?;

    banner(&settings);

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();
    tasks.push(tokio::spawn(transport::unix::run(
        local_listener,
        settings.socket_path.clone(),
        Arc::clone(&engine),
        shutdown.clone(),
    )));

    if settings.tcp_enabled {
        match transport::tcp::bind(settings.tcp_port).await {
            Ok(listener) => tasks.push(tokio::spawn(transport::tcp::run(
                listener,
                Arc::clone(&engine),
                shutdown.clone(),
            ))),
            Err(err) => error!(
                "could not bind TCP socket on port {}, continuing without it: {}",
                settings.tcp_port, err
            ),
        }
    }

    if settings.web_enabled {
        let engine_for_web = Arc::clone(&engine);
        let web_shutdown = shutdown.clone();
        let port = settings.web_port;
        let static_dir = settings.static_dir.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(err) = web::run(engine_for_web, port, static_dir, web_shutdown).await {
                error!("web interface unavailable: {:#}", err);
            }
        }));
    }

    let presenter = Arc::new(HeadlessPresenter::new(settings.surface_width));
    let audio = Arc::new(CommandAudioSink::new(settings.audio_player.clone()));
    let scheduler = DisplayScheduler::new(
        Arc::clone(&engine),
        presenter,
        audio,
        shutdown.clone(),
    );
    let scheduler_task = tokio::spawn(scheduler.run());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown requested");
    shutdown.cancel();

    for task in tasks {
        let _ = task.await;
    }
    // the scheduler finishes the current animation before observing the
    // cancellation, bounded by the remaining scroll distance
    let _ = scheduler_task.await;

    info!("shutdown complete");
    Ok(())
}

fn banner(settings: &Settings) {
    info!("server configuration:");
    info!("  local socket: {}", settings.socket_path.display());
    info!(
        "  tcp socket:   {}",
        if settings.tcp_enabled {
            format!("enabled (port {})", settings.tcp_port)
        } else {
            "disabled".to_string()
        }
    );
    info!(
        "  web ui:       {}",
        if settings.web_enabled {
            format!("enabled (port {})", settings.web_port)
        } else {
            "disabled".to_string()
        }
    );
}
