//! TCP listener: accepts peers and hands each one to a connection handler.
//!
//! Binding is split from the accept loop so a bad port or address fails
//! the process at startup with a real error, while the loop itself can
//! only ever end one way: the shutdown flag flipped.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::watch;
use tracing::{error, info};

use crate::application::paste_buffer::PasteBuffer;
use crate::infrastructure::network::connection::handle_connection;
use crate::infrastructure::network::registry::PeerRegistry;
use crate::service::stopped;

/// Accept backlog. Peers are long-lived desktop machines, not a request
/// flood, so a short queue is plenty.
pub const LISTEN_BACKLOG: u32 = 8;

/// Error type for listener setup. Always fatal: if the engine cannot
/// listen, there is nothing useful left for it to do.
#[derive(Debug, Error)]
pub enum ListenError {
    #[error("failed to bind listener on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Creates the listening socket with address reuse enabled.
///
/// Reuse matters for restart ergonomics: without it a crashed engine
/// leaves the port in TIME_WAIT and the replacement cannot bind for a
/// minute or more.
pub fn bind_listener(addr: SocketAddr) -> Result<TcpListener, ListenError> {
    let bind_failed = |source| ListenError::BindFailed { addr, source };

    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .map_err(bind_failed)?;

    socket.set_reuseaddr(true).map_err(bind_failed)?;
    #[cfg(unix)]
    socket.set_reuseport(true).map_err(bind_failed)?;

    socket.bind(addr).map_err(bind_failed)?;
    let listener = socket.listen(LISTEN_BACKLOG).map_err(bind_failed)?;
    // Resolve the actual address so "port 0" binds log something useful.
    let local = listener.local_addr().map_err(bind_failed)?;
    info!("listening on {local}");
    Ok(listener)
}

/// Runs the accept loop until shutdown is signaled.
///
/// Every accepted socket is handed to [`handle_connection`] in its own
/// task; the loop never waits on a handler. Transient accept errors
/// (file descriptor exhaustion, a peer resetting mid-handshake) are
/// logged and the loop keeps going. The listening socket closes when
/// this function returns, so no peer can connect after shutdown.
pub async fn accept_loop(
    listener: TcpListener,
    registry: Arc<PeerRegistry>,
    paste_buffer: Arc<PasteBuffer>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = stopped(&mut shutdown) => {
                info!("stopping accept loop");
                break;
            }
            result = listener.accept() => match result {
                Ok((stream, addr)) => {
                    tokio::spawn(handle_connection(
                        stream,
                        addr,
                        Arc::clone(&registry),
                        Arc::clone(&paste_buffer),
                        shutdown.clone(),
                    ));
                }
                Err(e) => {
                    error!("accept error: {e}");
                }
            },
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
