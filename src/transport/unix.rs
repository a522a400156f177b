//! Local Unix Socket Listener
//!
//! The mandatory transport: local delivery is the daemon's primary
//! contract, so a bind failure at startup is fatal and handled by the
//! caller. A stale socket file is removed before binding and the fresh
//! one is made world-writable so any local producer can submit.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;

use super::{serve_connection, ACCEPT_WAIT};
use crate::engine::EngineState;

/// Bind the local socket, clearing any stale file first. Failure here is
/// fatal to the process; the caller decides how loudly.
pub fn bind(path: &Path) -> io::Result<UnixListener> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        fs::remove_file(path)?;
    }

    let listener = UnixListener::bind(path)?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o666))?;
    Ok(listener)
}

/// Accept loop: one connection per poll cycle, bounded wait, cooperative
/// stop. Per-connection failures never stop the listener.
pub async fn run(
    listener: UnixListener,
    path: PathBuf,
    engine: Arc<EngineState>,
    shutdown: CancellationToken,
) {
    info!("listening for display messages on {}", path.display());
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = tokio::time::timeout(ACCEPT_WAIT, listener.accept()) => {
                match accepted {
                    Ok(Ok((mut stream, _addr))) => {
                        serve_connection(&mut stream, "local socket", &engine).await;
                    }
                    Ok(Err(err)) => warn!("accept failed on local socket: {}", err),
                    Err(_) => {} // bounded wait elapsed, go around
                }
            }
        }
    }

    let _ = fs::remove_file(&path);
    info!("local socket listener stopped");
}
