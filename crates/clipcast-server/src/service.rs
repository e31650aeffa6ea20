//! Engine assembly and lifecycle.
//!
//! [`ClipCastServer`] owns the long-lived pieces and wires them together:
//!
//! ```text
//! run()
//!  ├─ bind_listener()        fatal on failure
//!  ├─ HotkeySource::start()  fatal on failure (when a source is wired)
//!  └─ spawn
//!       ├─ accept_loop       spawns one task per accepted peer
//!       ├─ HotkeyPump        hotkey events → capture trigger / paste
//!       └─ CaptureWorker     capture trigger → selection → broadcast
//! ```
//!
//! # Cooperative shutdown (for beginners)
//!
//! Every long-lived task holds a `watch::Receiver<bool>` carrying a
//! "running" flag. [`ClipCastServer::shutdown`] flips the flag to
//! `false`; each task notices at its next suspension point and exits on
//! its own. Nothing is aborted, so a capture cycle or frame read that
//! has already started always finishes before its task stops. The
//! listening socket closes when the accept loop ends, which is what
//! actually frees the port.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::application::capture::{
    capture_channel, CaptureSink, CaptureTrigger, CaptureWorker, SelectionSource,
};
use crate::application::hotkeys::{HotkeyPump, PasteInjector};
use crate::application::paste_buffer::PasteBuffer;
use crate::infrastructure::hotkey::{HotkeyError, HotkeySource};
use crate::infrastructure::network::listener::{accept_loop, bind_listener, ListenError};
use crate::infrastructure::network::registry::PeerRegistry;

/// Resolves once `shutdown` signals that the engine should stop.
///
/// The watch channel carries a "running" flag: `true` while the engine is
/// up, `false` once shutdown begins. Long-lived tasks `select!` this
/// against their own work, so a task parked on a socket read or an
/// `accept` call still unblocks the moment the flag flips. A dropped
/// sender counts as shutdown too.
pub async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|running| !*running).await;
}

/// Error type for engine startup. Anything here aborts before a single
/// task is spawned.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("engine has already been started")]
    AlreadyStarted,

    #[error("listener startup failed: {0}")]
    Listen(#[from] ListenError),

    #[error("hotkey source startup failed: {0}")]
    Hotkey(#[from] HotkeyError),
}

/// Handles for the long-lived engine tasks, in shutdown join order.
struct EngineTasks {
    listener: JoinHandle<()>,
    pump: Option<JoinHandle<()>>,
    worker: JoinHandle<()>,
}

/// The assembled broadcast engine.
///
/// Collaborators are injected at construction, so tests run the whole
/// engine against a mock hotkey source and scripted clipboard doubles
/// while production wires in the real adapters. An engine instance runs
/// at most once; startup failures leave nothing running.
pub struct ClipCastServer {
    listen_addr: SocketAddr,
    hotkey_source: Option<Arc<dyn HotkeySource>>,
    selection: Arc<dyn SelectionSource>,
    injector: Arc<dyn PasteInjector>,
    sink: Option<Arc<dyn CaptureSink>>,
    registry: Arc<PeerRegistry>,
    paste_buffer: Arc<PasteBuffer>,
    trigger: CaptureTrigger,
    trigger_rx: Option<mpsc::Receiver<()>>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Option<EngineTasks>,
}

impl ClipCastServer {
    /// Builds an engine from its collaborators.
    ///
    /// Passing `None` for `hotkey_source` runs the engine without a
    /// hotkey pump: peers can still connect and deliver text, and
    /// [`capture_trigger`](Self::capture_trigger) still drives captures
    /// programmatically.
    pub fn new(
        listen_addr: SocketAddr,
        hotkey_source: Option<Arc<dyn HotkeySource>>,
        selection: Arc<dyn SelectionSource>,
        injector: Arc<dyn PasteInjector>,
        sink: Option<Arc<dyn CaptureSink>>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(true);
        let (trigger, trigger_rx) = capture_channel();
        Self {
            listen_addr,
            hotkey_source,
            selection,
            injector,
            sink,
            registry: Arc::new(PeerRegistry::new()),
            paste_buffer: Arc::new(PasteBuffer::new()),
            trigger,
            trigger_rx: Some(trigger_rx),
            shutdown_tx,
            tasks: None,
        }
    }

    /// Starts the engine and returns the address it is listening on.
    ///
    /// The bound address matters to callers because binding port 0 asks
    /// the OS to pick a free port; tests rely on that.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::Listen`] when the address cannot be bound
    /// and [`ServeError::Hotkey`] when the hotkey source fails to start.
    /// Both leave the engine with nothing running. A second call, or a
    /// call after shutdown, returns [`ServeError::AlreadyStarted`].
    pub async fn run(&mut self) -> Result<SocketAddr, ServeError> {
        // One engine, one run: `tasks` is occupied while running and
        // `trigger_rx` is gone once any run has started.
        if self.tasks.is_some() || self.trigger_rx.is_none() {
            return Err(ServeError::AlreadyStarted);
        }

        // Fatal startup steps come first; nothing is spawned until all
        // of them have succeeded.
        let listener = bind_listener(self.listen_addr)?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenError::BindFailed {
                addr: self.listen_addr,
                source,
            })?;
        let events = match &self.hotkey_source {
            Some(source) => Some(source.start()?),
            None => None,
        };

        let Some(trigger_rx) = self.trigger_rx.take() else {
            return Err(ServeError::AlreadyStarted);
        };

        let listener_task = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&self.registry),
            Arc::clone(&self.paste_buffer),
            self.shutdown_tx.subscribe(),
        ));
        let pump_task = events.map(|events| {
            tokio::spawn(
                HotkeyPump::new(
                    events,
                    self.trigger.clone(),
                    Arc::clone(&self.paste_buffer),
                    Arc::clone(&self.injector),
                    self.shutdown_tx.subscribe(),
                )
                .run(),
            )
        });
        let worker_task = tokio::spawn(
            CaptureWorker::new(
                trigger_rx,
                Arc::clone(&self.selection),
                self.sink.clone(),
                Arc::clone(&self.registry),
                self.shutdown_tx.subscribe(),
            )
            .run(),
        );

        self.tasks = Some(EngineTasks {
            listener: listener_task,
            pump: pump_task,
            worker: worker_task,
        });
        info!("engine running on {local_addr}");
        Ok(local_addr)
    }

    /// Stops the engine and waits for its tasks to finish.
    ///
    /// Safe to call before [`run`](Self::run) and safe to call twice;
    /// extra calls return once there is nothing left to stop. Peer
    /// connection tasks exit on the same flag and are not joined here;
    /// each one deregisters itself on the way out.
    pub async fn shutdown(&mut self) {
        let _ = self.shutdown_tx.send(false);

        let Some(tasks) = self.tasks.take() else {
            if let Some(source) = &self.hotkey_source {
                source.stop();
            }
            debug!("shutdown requested but no engine tasks are running");
            return;
        };

        info!("shutting down");
        if let Err(e) = tasks.listener.await {
            error!("accept loop task failed during shutdown: {e}");
        }
        if let Some(source) = &self.hotkey_source {
            source.stop();
        }
        if let Some(pump) = tasks.pump {
            if let Err(e) = pump.await {
                error!("hotkey pump task failed during shutdown: {e}");
            }
        }
        if let Err(e) = tasks.worker.await {
            error!("capture worker task failed during shutdown: {e}");
        }
        info!("engine stopped");
    }

    /// Returns a handle that requests a capture exactly as the capture
    /// hotkey does. Useful for embedding and for driving the engine
    /// without any hotkey source.
    pub fn capture_trigger(&self) -> CaptureTrigger {
        self.trigger.clone()
    }

    /// Number of currently connected peers.
    pub async fn peer_count(&self) -> usize {
        self.registry.peer_count().await
    }

    /// Handle to the slot holding the latest text received from peers.
    pub fn paste_buffer(&self) -> Arc<PasteBuffer> {
        Arc::clone(&self.paste_buffer)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
