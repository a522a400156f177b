//! Transport Listeners
//!
//! One listener per inbound channel: the mandatory local Unix stream
//! socket and the optional TCP socket. Each accepts a single connection
//! per poll cycle with a bounded wait so it can be stopped cooperatively,
//! reads at most one buffer's worth of bytes, decodes the wire record and
//! hands the request to the shared intake. A misbehaving client costs
//! that client its connection and nothing more: decode and I/O failures
//! are logged and the listener keeps serving.

pub mod tcp;
pub mod unix;

use std::time::Duration;

use log::{debug, warn};
use tokio::io::AsyncReadExt;

use crate::engine::{EngineState, SubmitOutcome};
use crate::wire;

/// Largest wire record a connection may deliver
pub const READ_BUFFER_BYTES: usize = 1024;

/// Bounded accept wait per poll cycle
pub const ACCEPT_WAIT: Duration = Duration::from_secs(1);

/// Read deadline for an accepted connection
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Read one record from an accepted connection and feed it to intake.
/// Never returns an error: every failure is local to the connection.
pub(crate) async fn serve_connection<S>(stream: &mut S, peer: &str, engine: &EngineState)
where
    S: tokio::io::AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; READ_BUFFER_BYTES];
    let read = match tokio::time::timeout(CONNECTION_TIMEOUT, stream.read(&mut buffer)).await {
        Ok(Ok(read)) => read,
        Ok(Err(err)) => {
            warn!("read failed on {} connection: {}", peer, err);
            return;
        }
        Err(_) => {
            warn!("{} connection timed out before sending a record", peer);
            return;
        }
    };

    if read == 0 {
        debug!("{} connection closed without data", peer);
        return;
    }

    match wire::decode(&buffer[..read]) {
        Ok(request) => match engine.submit(request) {
            SubmitOutcome::Accepted(id) => debug!("{} connection: accepted {}", peer, id),
            SubmitOutcome::Suppressed => debug!("{} connection: suppressed", peer),
            SubmitOutcome::Deduplicated => debug!("{} connection: merged duplicate", peer),
        },
        Err(err) => warn!("discarding malformed record from {}: {}", peer, err),
    }
}
