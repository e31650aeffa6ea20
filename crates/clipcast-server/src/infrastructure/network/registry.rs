//! Peer registry: the engine's in-memory table of connected peers.
//!
//! Each entry pairs a connection id with the write half of that peer's
//! socket. Read halves never enter the registry; they live inside the
//! per-connection handler task. Broadcasting walks a snapshot of the
//! table so a slow peer cannot hold the registry lock while its frame
//! drains.
//!
//! # Failure handling (for beginners)
//!
//! `broadcast_captured_text` does not remove peers itself. It reports the
//! ids whose write failed and leaves removal to the caller, which calls
//! [`PeerRegistry::deregister`] for each. Splitting the two steps keeps
//! the send loop free of re-entrant locking and means a peer that
//! disconnects mid-broadcast is reaped exactly once, even if its handler
//! task notices the hangup at the same moment.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use clipcast_core::{write_frame, FrameType, MAX_PAYLOAD_LEN};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// Identifier assigned to each accepted connection, unique for the
/// lifetime of the process.
pub type ConnectionId = u64;

// ── Peer handle ─────────────────────────────────────────────────────────────

/// Write-side handle for one connected peer.
///
/// Clones share the underlying socket half, so a handle snapshot taken
/// for a broadcast stays valid even if the registry entry is removed
/// while the broadcast is in flight.
#[derive(Clone)]
pub struct PeerHandle {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl PeerHandle {
    pub fn new(id: ConnectionId, addr: SocketAddr, writer: OwnedWriteHalf) -> Self {
        Self {
            id,
            addr,
            writer: Arc::new(Mutex::new(writer)),
        }
    }
}

impl std::fmt::Debug for PeerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerHandle")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .finish()
    }
}

// ── Registry ────────────────────────────────────────────────────────────────

/// Shared table of every peer currently connected to the engine.
///
/// # HashMap choice
///
/// A `HashMap<ConnectionId, PeerHandle>` gives O(1) removal when a
/// handler reports its peer gone. Broadcast order across peers is not
/// specified, so the map's arbitrary iteration order is fine.
#[derive(Default)]
pub struct PeerRegistry {
    peers: Mutex<HashMap<ConnectionId, PeerHandle>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a peer to the broadcast set.
    pub async fn register(&self, handle: PeerHandle) {
        let mut peers = self.peers.lock().await;
        debug!("peer {} registered from {}", handle.id, handle.addr);
        peers.insert(handle.id, handle);
    }

    /// Removes a peer. Returns `false` if the id was already gone, which
    /// happens when the handler and a failed broadcast both report the
    /// same disconnect.
    pub async fn deregister(&self, id: ConnectionId) -> bool {
        let removed = self.peers.lock().await.remove(&id);
        if let Some(handle) = &removed {
            debug!("peer {id} ({}) deregistered", handle.addr);
        }
        removed.is_some()
    }

    /// Number of peers currently registered.
    pub async fn peer_count(&self) -> usize {
        self.peers.lock().await.len()
    }

    /// Sends a `CapturedText` frame to every registered peer and returns
    /// the ids whose write failed.
    ///
    /// The registry lock is held only long enough to snapshot the handle
    /// list; the writes themselves run against each peer's own writer
    /// lock. Failed peers are *not* removed here, see the module docs.
    ///
    /// Text longer than the frame payload cap is refused outright: no
    /// peer receives anything and the returned list is empty, because no
    /// individual peer is at fault.
    pub async fn broadcast_captured_text(&self, text: &str) -> Vec<ConnectionId> {
        if text.len() as u64 > u64::from(MAX_PAYLOAD_LEN) {
            error!(
                "captured text is {} bytes, over the {} byte payload cap; dropping broadcast",
                text.len(),
                MAX_PAYLOAD_LEN
            );
            return Vec::new();
        }

        let handles: Vec<PeerHandle> = self.peers.lock().await.values().cloned().collect();
        let mut failed = Vec::new();
        for handle in handles {
            let mut writer = handle.writer.lock().await;
            match write_frame(&mut *writer, FrameType::CapturedText, text.as_bytes()).await {
                Ok(()) => {
                    debug!("delivered {} bytes of captured text to peer {}", text.len(), handle.id);
                }
                Err(e) => {
                    warn!("broadcast to peer {} ({}) failed: {e}", handle.id, handle.addr);
                    failed.push(handle.id);
                }
            }
        }
        failed
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clipcast_core::{read_frame_header, read_frame_payload, FrameType};
    use tokio::io::AsyncWriteExt;
    use tokio::net::{TcpListener, TcpStream};

    /// Builds a connected (client stream, server-side peer handle) pair
    /// over loopback.
    async fn make_peer(id: ConnectionId) -> (TcpStream, PeerHandle) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, peer_addr) = listener.accept().await.unwrap();
        let (_read_half, write_half) = server.into_split();
        (client, PeerHandle::new(id, peer_addr, write_half))
    }

    async fn read_captured_text(stream: &mut TcpStream) -> String {
        let header = read_frame_header(stream).await.unwrap();
        assert_eq!(header.frame_type(), Some(FrameType::CapturedText));
        let payload = read_frame_payload(stream, header.payload_len).await.unwrap();
        String::from_utf8(payload).unwrap()
    }

    #[tokio::test]
    async fn test_registry_starts_empty() {
        let registry = PeerRegistry::new();
        assert_eq!(registry.peer_count().await, 0);
    }

    #[tokio::test]
    async fn test_register_and_deregister_adjust_count() {
        // Arrange
        let registry = PeerRegistry::new();
        let (_client, handle) = make_peer(1).await;

        // Act / Assert
        registry.register(handle).await;
        assert_eq!(registry.peer_count().await, 1);
        assert!(registry.deregister(1).await);
        assert_eq!(registry.peer_count().await, 0);
    }

    #[tokio::test]
    async fn test_deregister_unknown_id_returns_false() {
        let registry = PeerRegistry::new();
        assert!(!registry.deregister(42).await);
    }

    #[tokio::test]
    async fn test_broadcast_delivers_frame_to_every_peer() {
        // Arrange
        let registry = PeerRegistry::new();
        let (mut client_a, handle_a) = make_peer(1).await;
        let (mut client_b, handle_b) = make_peer(2).await;
        registry.register(handle_a).await;
        registry.register(handle_b).await;

        // Act
        let failed = registry.broadcast_captured_text("selected words").await;

        // Assert
        assert!(failed.is_empty());
        assert_eq!(read_captured_text(&mut client_a).await, "selected words");
        assert_eq!(read_captured_text(&mut client_b).await, "selected words");
    }

    #[tokio::test]
    async fn test_broadcast_to_empty_registry_is_a_no_op() {
        let registry = PeerRegistry::new();
        let failed = registry.broadcast_captured_text("nobody listening").await;
        assert!(failed.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_reports_dead_peer_and_caller_reaps_it() {
        // Arrange: peer 2's write side is already shut down, so the
        // broadcast write fails deterministically.
        let registry = PeerRegistry::new();
        let (mut healthy_client, healthy) = make_peer(1).await;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _client = TcpStream::connect(addr).await.unwrap();
        let (server, peer_addr) = listener.accept().await.unwrap();
        let (_read_half, mut write_half) = server.into_split();
        write_half.shutdown().await.unwrap();
        let dead = PeerHandle::new(2, peer_addr, write_half);

        registry.register(healthy).await;
        registry.register(dead).await;

        // Act
        let failed = registry.broadcast_captured_text("payload").await;

        // Assert: only the dead peer is reported, and the healthy one
        // still received its frame.
        assert_eq!(failed, vec![2]);
        assert_eq!(read_captured_text(&mut healthy_client).await, "payload");

        for id in failed {
            registry.deregister(id).await;
        }
        assert_eq!(registry.peer_count().await, 1);
    }

    #[tokio::test]
    async fn test_broadcast_refuses_text_over_payload_cap() {
        // Arrange
        let registry = PeerRegistry::new();
        let (mut client, handle) = make_peer(1).await;
        registry.register(handle).await;
        let oversized = "x".repeat(MAX_PAYLOAD_LEN as usize + 1);

        // Act
        let failed = registry.broadcast_captured_text(&oversized).await;

        // Assert: refusal is not a peer failure, and the connection is
        // still usable for the next broadcast.
        assert!(failed.is_empty());
        assert_eq!(registry.peer_count().await, 1);
        let failed = registry.broadcast_captured_text("still alive").await;
        assert!(failed.is_empty());
        assert_eq!(read_captured_text(&mut client).await, "still alive");
    }
}
