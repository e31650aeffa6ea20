//! Unix signal bridge: `SIGUSR1` requests a capture, `SIGUSR2` a paste.
//!
//! This keeps the engine fully driveable without any GUI toolkit. Bind
//! your hotkey daemon of choice to `pkill -USR1 clipcast-server` and
//! `pkill -USR2 clipcast-server` and the whole pipeline works headless.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::{HotkeyError, HotkeyEvent, HotkeySource};

/// Capacity of the event channel handed to the pump. Hotkey presses are
/// human-rate; this never fills in practice.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// A [`HotkeySource`] backed by Unix user signals.
pub struct SignalHotkeySource {
    stop_tx: watch::Sender<bool>,
    started: AtomicBool,
}

impl SignalHotkeySource {
    pub fn new() -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            stop_tx,
            started: AtomicBool::new(false),
        }
    }
}

impl Default for SignalHotkeySource {
    fn default() -> Self {
        Self::new()
    }
}

impl HotkeySource for SignalHotkeySource {
    fn start(&self) -> Result<mpsc::Receiver<HotkeyEvent>, HotkeyError> {
        let mut capture =
            signal(SignalKind::user_defined1()).map_err(HotkeyError::SignalInstallFailed)?;
        let mut paste =
            signal(SignalKind::user_defined2()).map_err(HotkeyError::SignalInstallFailed)?;
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(HotkeyError::AlreadyStarted);
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let mut stop = self.stop_tx.subscribe();
        tokio::spawn(async move {
            info!("signal hotkey source listening (SIGUSR1 = capture, SIGUSR2 = paste)");
            loop {
                let event = tokio::select! {
                    biased;
                    // Resolves on stop() and also if the source itself is
                    // dropped; either way this task must end.
                    _ = stop.wait_for(|stopped| *stopped) => break,
                    maybe = capture.recv() => match maybe {
                        Some(()) => HotkeyEvent::Capture,
                        None => break,
                    },
                    maybe = paste.recv() => match maybe {
                        Some(()) => HotkeyEvent::Paste,
                        None => break,
                    },
                };
                // Dropping an event under backpressure is fine; capture
                // requests debounce downstream anyway.
                if let Err(e) = tx.try_send(event) {
                    warn!("hotkey event dropped: {e}");
                }
            }
            debug!("signal hotkey source stopped");
        });

        Ok(rx)
    }

    fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use std::time::Duration;
    use tokio::time::timeout;

    /// Sends `sig` to this test process. `kill` is a shell builtin, so
    /// this works wherever `sh` exists.
    fn raise(sig: &str) {
        let status = Command::new("sh")
            .arg("-c")
            .arg(format!("kill -{sig} {}", std::process::id()))
            .status()
            .expect("failed to run sh");
        assert!(status.success(), "kill -{sig} failed");
    }

    /// Receives events until `expected` shows up.
    ///
    /// Signal delivery is process-wide and these tests run in parallel
    /// threads, so a source can observe signals raised by a sibling
    /// test. Skipping unrelated events keeps the tests independent.
    async fn expect_event(events: &mut mpsc::Receiver<HotkeyEvent>, expected: HotkeyEvent) {
        for _ in 0..16 {
            let event = timeout(Duration::from_secs(5), events.recv())
                .await
                .expect("no event arrived")
                .expect("event channel closed");
            if event == expected {
                return;
            }
        }
        panic!("{expected:?} never arrived");
    }

    #[tokio::test]
    async fn test_sigusr1_becomes_a_capture_event() {
        // Arrange: the handler must be installed before the signal is
        // raised, or the default disposition would kill the process.
        let source = SignalHotkeySource::new();
        let mut events = source.start().unwrap();

        // Act
        raise("USR1");

        // Assert
        expect_event(&mut events, HotkeyEvent::Capture).await;

        source.stop();
    }

    #[tokio::test]
    async fn test_sigusr2_becomes_a_paste_event() {
        // Arrange
        let source = SignalHotkeySource::new();
        let mut events = source.start().unwrap();

        // Act
        raise("USR2");

        // Assert
        expect_event(&mut events, HotkeyEvent::Paste).await;

        source.stop();
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        // Arrange
        let source = SignalHotkeySource::new();
        let _events = source.start().unwrap();

        // Act / Assert
        assert!(matches!(source.start(), Err(HotkeyError::AlreadyStarted)));

        source.stop();
    }

    #[tokio::test]
    async fn test_stop_closes_the_event_channel() {
        // Arrange
        let source = SignalHotkeySource::new();
        let mut events = source.start().unwrap();

        // Act
        source.stop();

        // Assert: the bridge task drops its sender, so recv eventually
        // returns None. Stray events raised by sibling tests may still
        // be queued ahead of the close.
        loop {
            let received = timeout(Duration::from_secs(5), events.recv())
                .await
                .expect("channel never closed");
            if received.is_none() {
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_stop_before_start_is_harmless() {
        let source = SignalHotkeySource::new();
        source.stop();
        source.stop();
    }
}
