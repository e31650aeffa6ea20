//! HotkeyUseCase: dispatches hotkey events to the capture and paste paths.
//!
//! The pump is the only consumer of the hotkey event stream. Capture
//! events cost one non-blocking [`CaptureTrigger::fire`] call, so a held
//! or repeated hotkey can never back up behind slow capture work; the
//! debouncing happens downstream in the capture worker. Paste events are
//! handled inline: read the latest paste buffer snapshot and hand it to
//! the injector.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::application::capture::CaptureTrigger;
use crate::application::paste_buffer::PasteBuffer;
use crate::infrastructure::hotkey::HotkeyEvent;
use crate::service::stopped;

/// Trait for pushing text into the OS clipboard and synthesizing the
/// paste keystroke.
///
/// Infrastructure implementations talk to the system clipboard; test
/// implementations record calls.
#[async_trait]
pub trait PasteInjector: Send + Sync {
    /// Injects one paste. The error string is only ever logged.
    async fn inject_paste(&self, text: &str) -> Result<(), String>;
}

/// The single consumer of hotkey events.
pub struct HotkeyPump {
    events: mpsc::Receiver<HotkeyEvent>,
    trigger: CaptureTrigger,
    paste_buffer: Arc<PasteBuffer>,
    injector: Arc<dyn PasteInjector>,
    shutdown: watch::Receiver<bool>,
}

impl HotkeyPump {
    pub fn new(
        events: mpsc::Receiver<HotkeyEvent>,
        trigger: CaptureTrigger,
        paste_buffer: Arc<PasteBuffer>,
        injector: Arc<dyn PasteInjector>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            events,
            trigger,
            paste_buffer,
            injector,
            shutdown,
        }
    }

    /// Runs until shutdown is signaled or the hotkey source closes its
    /// event channel. Events from one source are handled strictly in
    /// arrival order.
    pub async fn run(mut self) {
        info!("hotkey pump started");
        loop {
            tokio::select! {
                biased;
                _ = stopped(&mut self.shutdown) => break,
                event = self.events.recv() => match event {
                    Some(HotkeyEvent::Capture) => self.trigger.fire(),
                    Some(HotkeyEvent::Paste) => self.run_paste_cycle().await,
                    None => {
                        debug!("hotkey source closed its event channel");
                        break;
                    }
                },
            }
        }
        info!("hotkey pump stopped");
    }

    /// One paste cycle: snapshot the buffer, hand the text to the
    /// injector. A failure abandons this paste and nothing else.
    async fn run_paste_cycle(&self) {
        let snapshot = self.paste_buffer.latest();
        if snapshot.text.is_empty() {
            warn!("paste requested but no text has been received yet");
            return;
        }
        debug!(
            "injecting paste of {} bytes (buffer version {})",
            snapshot.text.len(),
            snapshot.version
        );
        if let Err(e) = self.injector.inject_paste(&snapshot.text).await {
            warn!("paste injection failed: {e}");
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
