//! Audio Playback Capability
//!
//! Playing a clip is an opaque call to an injected [`AudioSink`]. The
//! shipped implementation hands the file to an external player process and
//! watches it from a detached context; the only shared state is a
//! "currently playing" flag. Playback failures are the caller's to log,
//! never to propagate into the display timeline.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use thiserror::Error;
use tokio::process::Command;

/// Result type for playback operations
pub type PlaybackResult<T> = Result<T, PlaybackError>;

/// Errors from audio playback
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The clip path does not name an existing file
    #[error("audio file not found: {0}")]
    FileNotFound(PathBuf),

    /// The player process could not be started
    #[error("failed to start audio player {player:?}: {source}")]
    Spawn {
        player: String,
        source: std::io::Error,
    },

    /// The player exited unsuccessfully
    #[error("audio player exited with {0}")]
    PlayerFailed(std::process::ExitStatus),
}

/// Plays one audio clip to completion
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, path: &Path) -> PlaybackResult<()>;

    /// Whether a clip is currently playing; polled, never waited on
    fn is_playing(&self) -> bool;
}

/// Sink that shells out to an external player binary (default `aplay`)
pub struct CommandAudioSink {
    player: String,
    playing: Arc<AtomicBool>,
}

impl CommandAudioSink {
    pub fn new(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            playing: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for CommandAudioSink {
    fn default() -> Self {
        Self::new("aplay")
    }
}

#[async_trait]
impl AudioSink for CommandAudioSink {
    async fn play(&self, path: &Path) -> PlaybackResult<()> {
        if !path.is_file() {
            return Err(PlaybackError::FileNotFound(path.to_path_buf()));
        }

        debug!("playing audio clip {} via {}", path.display(), self.player);
        let mut child = Command::new(&self.player)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| PlaybackError::Spawn {
                player: self.player.clone(),
                source,
            })?;

        self.playing.store(true, Ordering::SeqCst);
        let status = child.wait().await;
        self.playing.store(false, Ordering::SeqCst);

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(PlaybackError::PlayerFailed(status)),
            Err(source) => Err(PlaybackError::Spawn {
                player: self.player.clone(),
                source,
            }),
        }
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

/// Sink that swallows playback; used in tests and headless deployments
#[derive(Debug, Default)]
pub struct NullAudioSink {
    played: AtomicBool,
}

impl NullAudioSink {
    pub fn was_played(&self) -> bool {
        self.played.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioSink for NullAudioSink {
    async fn play(&self, path: &Path) -> PlaybackResult<()> {
        if !path.is_file() {
            return Err(PlaybackError::FileNotFound(path.to_path_buf()));
        }
        self.played.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        false
    }
}
