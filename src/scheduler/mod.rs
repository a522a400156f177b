//! Display Scheduler
//!
//! The single consumer of the notification queue. The loop is a small
//! state machine: Idle (poll the queue), Armed (acquire the surface and
//! kick off audio), Animating (drive the scroll timeline frame by frame),
//! back to Idle. Exactly one notification is ever Animating; a
//! higher-priority arrival waits in the queue rather than preempting an
//! animation already in flight.
//!
//! Failure handling is strictly local: an acquisition failure drops the
//! notification (it already left the queue, there is no retry), a frame
//! failure or surface teardown ends the animation as if it had completed,
//! and audio problems never touch the visual timeline.

pub mod timeline;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::audio::AudioSink;
use crate::display::{Canvas, DisplayError, DisplayResult, Presenter, Style};
use crate::engine::{EngineState, Notification};
use self::timeline::ScrollTimeline;

/// Queue poll interval while Idle
pub const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct DisplayScheduler {
    engine: Arc<EngineState>,
    presenter: Arc<dyn Presenter>,
    audio: Arc<dyn AudioSink>,
    shutdown: CancellationToken,
    poll_interval: Duration,
}

impl DisplayScheduler {
    pub fn new(
        engine: Arc<EngineState>,
        presenter: Arc<dyn Presenter>,
        audio: Arc<dyn AudioSink>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            engine,
            presenter,
            audio,
            shutdown,
            poll_interval: IDLE_POLL_INTERVAL,
        }
    }

    /// Faster idle polling for tests.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run until shutdown. Cancellation is only observed while Idle, so a
    /// notification mid-animation unwinds naturally (bounded by its
    /// remaining scroll distance times its speed) before the loop exits.
    pub async fn run(self) {
        info!("display scheduler started");
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            // expired suppression/dedup entries ride the idle tick
            self.engine.sweep_expired();

            match self.engine.pop_next() {
                Some(notification) => self.display(notification).await,
                None => {
                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
            }
        }
        info!("display scheduler stopped");
    }

    /// Armed: acquire the surface, start audio, then animate. The surface
    /// is released on every exit path so a failure can never leave it
    /// acquired.
    async fn display(&self, notification: Notification) {
        let mut canvas = match self.presenter.acquire().await {
            Ok(canvas) => canvas,
            Err(err) => {
                warn!(
                    "dropping message {:?}: {}",
                    notification.request.text, err
                );
                return;
            }
        };

        self.engine.set_active(&notification);
        self.start_audio(&notification);

        debug!(
            "animating message {:?} (priority {})",
            notification.request.text, notification.request.priority
        );
        match self.animate(canvas.as_mut(), &notification).await {
            Ok(()) => debug!("message {} scrolled to completion", notification.id),
            Err(err) => warn!("animation for {} ended early: {}", notification.id, err),
        }

        canvas.release();
        self.engine.clear_active();
    }

    /// Animating: scroll the text from the right edge until it has fully
    /// left the surface, or until the surface disappears.
    async fn animate(&self, canvas: &mut dyn Canvas, notification: &Notification) -> DisplayResult<()> {
        let request = &notification.request;
        let style = Style::for_request(request);
        let text_width = canvas.measure(&request.text, &style);
        let mut timeline = ScrollTimeline::new(canvas.width(), text_width, request.speed);

        while let Some(step) = timeline.next_frame() {
            if !canvas.is_available() {
                return Err(DisplayError::SurfaceLost);
            }
            let frame = canvas.render(&request.text, &style, step.blink_visible)?;
            canvas.present(&frame, step.offset)?;
            tokio::time::sleep(timeline.frame_delay()).await;
        }
        Ok(())
    }

    /// Fire-and-forget audio. Whatever happens in playback is logged by
    /// the detached task; the animation never waits on it.
    fn start_audio(&self, notification: &Notification) {
        let path = notification.request.audio_path.trim();
        if path.is_empty() {
            return;
        }

        let sink = Arc::clone(&self.audio);
        let path = PathBuf::from(path);
        tokio::spawn(async move {
            if let Err(err) = sink.play(&path).await {
                warn!("audio playback failed for {}: {}", path.display(), err);
            }
        });
    }
}
