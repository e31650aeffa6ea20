//! Hotkey infrastructure: sources of capture and paste request events.
//!
//! Global hotkey registration itself belongs to desktop tooling outside
//! this process. What ships here is the seam: a [`HotkeySource`] hands
//! the engine a stream of [`HotkeyEvent`]s, and anything able to poke
//! the process can stand on the other side of it.
//!
//! - [`signals`] bridges Unix signals (`SIGUSR1` requests a capture,
//!   `SIGUSR2` a paste), which any hotkey daemon can send with a one-line
//!   command binding.
//! - [`mock`] lets tests inject synthetic events.

use tokio::sync::mpsc;

pub mod mock;
#[cfg(unix)]
pub mod signals;

/// One user request delivered by a hotkey source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// Capture the current selection and broadcast it to peers.
    Capture,
    /// Paste the latest received text locally.
    Paste,
}

/// Error type for hotkey source operations.
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("failed to install signal handler: {0}")]
    SignalInstallFailed(#[source] std::io::Error),
    #[error("hotkey source has already been started")]
    AlreadyStarted,
}

/// Trait abstracting hotkey event production.
///
/// The shipped implementation listens for Unix signals; tests use
/// [`mock::MockHotkeySource`].
pub trait HotkeySource: Send + Sync {
    /// Starts the source and returns the receiver for its events.
    ///
    /// Must be called from within a Tokio runtime.
    fn start(&self) -> Result<mpsc::Receiver<HotkeyEvent>, HotkeyError>;

    /// Stops the source and releases any OS resources. Safe to call
    /// before `start` and safe to call twice.
    fn stop(&self);
}
