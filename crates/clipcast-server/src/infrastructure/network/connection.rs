//! Per-connection handler: the inbound half of the relay.
//!
//! Each accepted socket gets exactly one handler task. The handler:
//!
//! 1. Splits the stream, parks the write half in the [`PeerRegistry`]
//!    (that is the handle broadcasts go out through), and keeps the
//!    read half for itself.
//! 2. Reads frames in arrival order. `TextForPaste` payloads replace
//!    the shared [`PasteBuffer`] contents; everything else is drained
//!    and skipped so the stream never desynchronizes.
//! 3. Deregisters itself on any exit, whether the peer hung up, the
//!    stream misbehaved, or the engine is shutting down.
//!
//! A handler never talks to other handlers. A peer that stalls, floods,
//! or resets affects its own connection and nothing else.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use clipcast_core::{
    drain_frame_payload, read_frame_header, read_frame_payload, CodecError, FrameType,
    MAX_PAYLOAD_LEN,
};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::application::paste_buffer::PasteBuffer;
use crate::infrastructure::network::registry::{ConnectionId, PeerHandle, PeerRegistry};
use crate::service::stopped;

/// Counter backing [`next_connection_id`]. Starts at 1 so id 0 can mean
/// "no connection" in log output if that ever becomes useful.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates a process-unique id for a newly accepted connection.
pub fn next_connection_id() -> ConnectionId {
    NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Why a handler's read loop ended.
enum ExitReason {
    /// The peer closed the connection at a frame boundary.
    PeerClosed,
    /// The engine is shutting down.
    ShutdownRequested,
    /// The stream died mid-frame or returned an I/O error.
    ReadFailed(CodecError),
}

/// Runs the complete lifecycle of one peer connection.
///
/// Spawned by the listener for every accepted socket; never returns an
/// error because every failure mode ends the same way: log, deregister,
/// drop the socket.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    registry: Arc<PeerRegistry>,
    paste_buffer: Arc<PasteBuffer>,
    mut shutdown: watch::Receiver<bool>,
) {
    let id = next_connection_id();
    let (reader, writer) = stream.into_split();
    registry.register(PeerHandle::new(id, addr, writer)).await;
    info!("peer {id} connected from {addr}");

    match read_loop(id, reader, &paste_buffer, &mut shutdown).await {
        ExitReason::PeerClosed => info!("peer {id} ({addr}) disconnected"),
        ExitReason::ShutdownRequested => debug!("closing connection {id} ({addr}) for shutdown"),
        ExitReason::ReadFailed(e) => warn!("dropping peer {id} ({addr}): {e}"),
    }

    registry.deregister(id).await;
}

/// Reads frames until the peer disconnects, the stream errors, or
/// shutdown is signaled.
///
/// The shutdown check lives on the header read, the loop's one
/// long-lived suspension point. Once a header has arrived the rest of
/// that frame is always consumed, so a frame in flight is either fully
/// processed or fully drained, never half-read.
async fn read_loop(
    id: ConnectionId,
    mut reader: OwnedReadHalf,
    paste_buffer: &PasteBuffer,
    shutdown: &mut watch::Receiver<bool>,
) -> ExitReason {
    loop {
        let header = tokio::select! {
            _ = stopped(shutdown) => return ExitReason::ShutdownRequested,
            result = read_frame_header(&mut reader) => match result {
                Ok(header) => header,
                Err(CodecError::Disconnected) => return ExitReason::PeerClosed,
                Err(e) => return ExitReason::ReadFailed(e),
            },
        };

        // A length over the cap is a protocol violation but not a hanging
        // offense: consume the declared bytes so the next header lines up,
        // and give the peer another chance.
        if header.exceeds_cap() {
            error!(
                "peer {id} declared a {} byte payload, over the {MAX_PAYLOAD_LEN} byte cap; draining frame",
                header.payload_len
            );
            if let Err(e) = drain_frame_payload(&mut reader, header.payload_len).await {
                return ExitReason::ReadFailed(e);
            }
            continue;
        }

        match header.frame_type() {
            Some(FrameType::TextForPaste) => {
                let payload = match read_frame_payload(&mut reader, header.payload_len).await {
                    Ok(payload) => payload,
                    Err(e) => return ExitReason::ReadFailed(e),
                };
                // Payload bytes are treated as text. Invalid UTF-8 is not a
                // rejection, the offending sequences become replacement
                // characters and the frame still lands.
                let text = match String::from_utf8(payload) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("peer {id} sent paste text with invalid UTF-8; replacing bad sequences");
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                };
                let version = paste_buffer.publish(text);
                debug!(
                    "peer {id} staged {} bytes of paste text (version {version})",
                    header.payload_len
                );
            }
            Some(FrameType::CapturedText) => {
                // That type only flows engine-to-peer. Inbound it is
                // meaningless, so treat it like an unknown frame.
                warn!(
                    "peer {id} sent a captured-text frame in the wrong direction; skipping {} bytes",
                    header.payload_len
                );
                if let Err(e) = drain_frame_payload(&mut reader, header.payload_len).await {
                    return ExitReason::ReadFailed(e);
                }
            }
            None => {
                debug!(
                    "peer {id} sent unknown frame type {:#04x}; skipping {} bytes",
                    header.type_byte, header.payload_len
                );
                if let Err(e) = drain_frame_payload(&mut reader, header.payload_len).await {
                    return ExitReason::ReadFailed(e);
                }
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
