//! System clipboard adapter backing the selection and paste seams.
//!
//! On Linux the "current selection" is the X11/Wayland primary
//! selection, which `arboard` exposes directly, so capture works without
//! simulating any copy keystroke. Elsewhere the regular clipboard is the
//! closest available stand-in and the user copies before hitting the
//! capture hotkey.
//!
//! Paste injection here means staging the text on the system clipboard.
//! Synthesizing the actual paste keystroke is left to whatever drives
//! the hotkeys, which already owns input synthesis.
//!
//! `arboard` calls are blocking X11/COM round-trips, so every call runs
//! on the blocking thread pool, and capture is additionally bounded by a
//! configured timeout: a wedged clipboard owner degrades a capture into
//! an empty result instead of stalling the worker forever.

use std::time::Duration;

use arboard::Clipboard;
#[cfg(target_os = "linux")]
use arboard::{GetExtLinux, LinuxClipboardKind};
use async_trait::async_trait;
use tokio::task;
use tokio::time::timeout;
use tracing::warn;

use crate::application::capture::SelectionSource;
use crate::application::hotkeys::PasteInjector;

/// Clipboard-backed implementation of both clipboard-facing seams.
pub struct SystemClipboard {
    selection_timeout: Duration,
}

impl SystemClipboard {
    pub fn new(selection_timeout: Duration) -> Self {
        Self { selection_timeout }
    }
}

/// Reads the current selection. Empty and "nothing there" both map to
/// an empty string; only real clipboard failures surface as errors.
fn read_selection_blocking() -> Result<String, String> {
    let mut clipboard = Clipboard::new().map_err(|e| e.to_string())?;

    #[cfg(target_os = "linux")]
    let result = clipboard
        .get()
        .clipboard(LinuxClipboardKind::Primary)
        .text();
    #[cfg(not(target_os = "linux"))]
    let result = clipboard.get_text();

    match result {
        Ok(text) => Ok(text),
        Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
        Err(e) => Err(e.to_string()),
    }
}

fn write_clipboard_blocking(text: &str) -> Result<(), String> {
    let mut clipboard = Clipboard::new().map_err(|e| e.to_string())?;
    clipboard.set_text(text).map_err(|e| e.to_string())
}

#[async_trait]
impl SelectionSource for SystemClipboard {
    async fn capture_selected_text(&self) -> String {
        let read = task::spawn_blocking(read_selection_blocking);
        match timeout(self.selection_timeout, read).await {
            Ok(Ok(Ok(text))) => text,
            Ok(Ok(Err(e))) => {
                warn!("selection read failed: {e}");
                String::new()
            }
            Ok(Err(e)) => {
                warn!("selection read task failed: {e}");
                String::new()
            }
            Err(_) => {
                warn!(
                    "selection read timed out after {:?}; treating as empty",
                    self.selection_timeout
                );
                String::new()
            }
        }
    }
}

#[async_trait]
impl PasteInjector for SystemClipboard {
    async fn inject_paste(&self, text: &str) -> Result<(), String> {
        let text = text.to_string();
        task::spawn_blocking(move || write_clipboard_blocking(&text))
            .await
            .map_err(|e| e.to_string())?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests run against the real clipboard when a display is
    // available and degrade to no-ops in headless environments. What
    // they guarantee everywhere: no panic, no hang, correct empty-result
    // behavior on failure.

    #[tokio::test]
    async fn test_capture_never_panics_and_respects_timeout() {
        let clipboard = SystemClipboard::new(Duration::from_secs(2));
        let started = std::time::Instant::now();
        let _text = clipboard.capture_selected_text().await;
        assert!(
            started.elapsed() < Duration::from_secs(10),
            "capture must never stall past its timeout"
        );
    }

    #[tokio::test]
    async fn test_inject_paste_roundtrips_when_display_available() {
        let clipboard = SystemClipboard::new(Duration::from_secs(2));
        if clipboard.inject_paste("clipcast roundtrip").await.is_ok() {
            // The clipboard may be served by another process by the time
            // we read it back, so only a successful read is asserted on.
            if let Ok(text) = Clipboard::new().and_then(|mut c| c.get_text()) {
                assert_eq!(text, "clipcast roundtrip");
            }
        }
    }

    #[tokio::test]
    async fn test_headless_failure_surfaces_as_error_not_panic() {
        // Whichever way the environment behaves, inject_paste returns a
        // Result rather than exploding.
        let clipboard = SystemClipboard::new(Duration::from_secs(2));
        let _ = clipboard.inject_paste("either outcome is fine").await;
    }
}
