//! Mock hotkey source for testing.
//!
//! Allows tests to inject synthetic [`HotkeyEvent`]s without touching
//! signal handlers or any OS facility.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::{HotkeyError, HotkeyEvent, HotkeySource};

/// A mock implementation of [`HotkeySource`] that lets tests inject events.
pub struct MockHotkeySource {
    sender: Arc<Mutex<Option<mpsc::Sender<HotkeyEvent>>>>,
}

impl MockHotkeySource {
    /// Creates a new mock hotkey source.
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
        }
    }

    /// Injects a synthetic event, as if a hotkey had fired.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been
    /// called.
    pub fn inject(&self, event: HotkeyEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        if let Some(ref sender) = *guard {
            sender
                .try_send(event)
                .expect("event channel full or receiver dropped");
        } else {
            panic!("MockHotkeySource::inject called before start()");
        }
    }
}

impl Default for MockHotkeySource {
    fn default() -> Self {
        Self::new()
    }
}

impl HotkeySource for MockHotkeySource {
    fn start(&self) -> Result<mpsc::Receiver<HotkeyEvent>, HotkeyError> {
        let (tx, rx) = mpsc::channel(16);
        *self.sender.lock().expect("lock poisoned") = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Drop the sender to close the channel
        *self.sender.lock().expect("lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_hotkey_source_delivers_injected_events_in_order() {
        // Arrange
        let source = MockHotkeySource::new();
        let mut rx = source.start().expect("start should succeed");

        // Act
        source.inject(HotkeyEvent::Capture);
        source.inject(HotkeyEvent::Paste);
        source.inject(HotkeyEvent::Capture);

        // Assert
        assert_eq!(rx.recv().await, Some(HotkeyEvent::Capture));
        assert_eq!(rx.recv().await, Some(HotkeyEvent::Paste));
        assert_eq!(rx.recv().await, Some(HotkeyEvent::Capture));
    }

    #[tokio::test]
    async fn test_mock_hotkey_source_stop_closes_channel() {
        // Arrange
        let source = MockHotkeySource::new();
        let mut rx = source.start().expect("start should succeed");

        // Act
        source.stop();

        // Assert
        assert_eq!(rx.recv().await, None, "channel should be closed after stop()");
    }

    #[test]
    #[should_panic(expected = "inject called before start")]
    fn test_inject_before_start_panics() {
        let source = MockHotkeySource::new();
        source.inject(HotkeyEvent::Capture);
    }
}
