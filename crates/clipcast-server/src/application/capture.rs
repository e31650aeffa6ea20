//! CaptureUseCase: the debounced capture-and-broadcast pipeline.
//!
//! This is the outbound half of the engine. Hotkey infrastructure fires a
//! [`CaptureTrigger`]; a single [`CaptureWorker`] task turns trigger
//! bursts into capture cycles: read the current text selection, archive
//! it if a sink is configured, broadcast it to every peer.
//!
//! # Debounce protocol (for beginners)
//!
//! The trigger side and the worker share a channel of capacity one. That
//! single slot *is* the "capture pending" flag:
//!
//! - Firing into an empty slot stores the request; the worker wakes.
//! - Firing into a full slot is a no-op; the request coalesces with the
//!   one already stored.
//! - The worker consumes the slot *before* starting the (slow) capture
//!   work, so a trigger that arrives mid-cycle lands in the empty slot
//!   and produces exactly one follow-up cycle.
//!
//! Net effect: hammering the hotkey N times yields between one and N
//! cycles, and a trigger is never silently lost. The hotkey source never
//! waits on a capture either; `fire` is synchronous and cannot block.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::infrastructure::network::registry::PeerRegistry;
use crate::service::stopped;

// ── Collaborator traits ─────────────────────────────────────────────────────

/// Trait for reading the OS's current text selection.
///
/// Infrastructure implementations talk to the system clipboard or
/// selection buffer; test implementations return scripted text.
#[async_trait]
pub trait SelectionSource: Send + Sync {
    /// Returns the currently selected text, or an empty string if there
    /// is no selection or the read failed or timed out. The worker treats
    /// all three the same way, so implementations should not error.
    async fn capture_selected_text(&self) -> String;
}

/// Trait for archiving captured text somewhere durable.
///
/// The sink is fire-and-forget: a failure is logged and the capture
/// cycle carries on. Test implementations record calls.
#[async_trait]
pub trait CaptureSink: Send + Sync {
    /// Persists one capture. The error string is only ever logged.
    async fn persist_captured_text(&self, text: &str) -> Result<(), String>;
}

// ── Trigger ─────────────────────────────────────────────────────────────────

/// Sending side of the capture debounce slot.
///
/// Cheap to clone; hotkey infrastructure holds one and fires it from
/// whatever context delivers hotkey events.
#[derive(Clone, Debug)]
pub struct CaptureTrigger {
    tx: mpsc::Sender<()>,
}

impl CaptureTrigger {
    /// Requests a capture. Never blocks.
    pub fn fire(&self) {
        match self.tx.try_send(()) {
            Ok(()) => debug!("capture requested"),
            Err(TrySendError::Full(())) => {
                debug!("capture already pending; trigger coalesced");
            }
            Err(TrySendError::Closed(())) => {
                debug!("capture worker is gone; trigger dropped");
            }
        }
    }
}

/// Creates the trigger/receiver pair for one worker.
pub fn capture_channel() -> (CaptureTrigger, mpsc::Receiver<()>) {
    // Capacity one: the channel is a pending flag, not a queue.
    let (tx, rx) = mpsc::channel(1);
    (CaptureTrigger { tx }, rx)
}

// ── Worker ──────────────────────────────────────────────────────────────────

/// The single consumer of capture triggers.
///
/// Collaborators are injected at construction time, so the whole
/// pipeline runs under test with scripted doubles and a loopback
/// registry.
pub struct CaptureWorker {
    trigger_rx: mpsc::Receiver<()>,
    selection: Arc<dyn SelectionSource>,
    sink: Option<Arc<dyn CaptureSink>>,
    registry: Arc<PeerRegistry>,
    shutdown: watch::Receiver<bool>,
}

impl CaptureWorker {
    pub fn new(
        trigger_rx: mpsc::Receiver<()>,
        selection: Arc<dyn SelectionSource>,
        sink: Option<Arc<dyn CaptureSink>>,
        registry: Arc<PeerRegistry>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            trigger_rx,
            selection,
            sink,
            registry,
            shutdown,
        }
    }

    /// Runs until shutdown is signaled or every trigger handle is gone.
    ///
    /// Shutdown is only checked between cycles; a cycle that has already
    /// started always runs to completion.
    pub async fn run(mut self) {
        info!("capture worker started");
        loop {
            tokio::select! {
                // Shutdown wins when a trigger is pending at the same time.
                biased;
                _ = stopped(&mut self.shutdown) => break,
                request = self.trigger_rx.recv() => match request {
                    Some(()) => self.run_capture_cycle().await,
                    None => break,
                },
            }
        }
        info!("capture worker stopped");
    }

    /// One capture cycle: selection read, optional archive, broadcast,
    /// reap of peers whose send failed.
    async fn run_capture_cycle(&self) {
        let text = self.selection.capture_selected_text().await;
        if text.is_empty() {
            warn!("selection capture returned no text; nothing to broadcast");
            return;
        }
        info!("captured {} bytes of selected text", text.len());

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.persist_captured_text(&text).await {
                warn!("capture sink failed (broadcast continues): {e}");
            }
        }

        let failed = self.registry.broadcast_captured_text(&text).await;
        for id in failed {
            self.registry.deregister(id).await;
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
