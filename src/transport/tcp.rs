//! Network Socket Listener
//!
//! Optional transport for producers elsewhere on the network, enabled by
//! configuration. A bind failure is not fatal: the daemon keeps running
//! on local delivery and logs the loss.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{info, warn};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::{serve_connection, ACCEPT_WAIT};
use crate::engine::EngineState;

/// Default listen port for network messages
pub const DEFAULT_PORT: u16 = 5555;

pub async fn bind(port: u16) -> io::Result<TcpListener> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    TcpListener::bind(addr).await
}

/// Accept loop, mirroring the local listener's discipline: one connection
/// per cycle, bounded wait, per-connection failure isolation.
pub async fn run(listener: TcpListener, engine: Arc<EngineState>, shutdown: CancellationToken) {
    match listener.local_addr() {
        Ok(addr) => info!("listening for network messages on {}", addr),
        Err(_) => info!("listening for network messages"),
    }

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = tokio::time::timeout(ACCEPT_WAIT, listener.accept()) => {
                match accepted {
                    Ok(Ok((mut stream, addr))) => {
                        let peer = addr.to_string();
                        serve_connection(&mut stream, &peer, &engine).await;
                    }
                    Ok(Err(err)) => warn!("accept failed on network socket: {}", err),
                    Err(_) => {}
                }
            }
        }
    }
    info!("network socket listener stopped");
}
