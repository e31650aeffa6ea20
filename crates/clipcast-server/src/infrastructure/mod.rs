//! Infrastructure layer for the broadcast engine.
//!
//! Contains OS-facing adapters: TCP sockets, Unix signal handling, the
//! system clipboard, and file-system storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `clipcast_core`, but MUST NOT be imported by the `application` layer.
//! The application reaches infrastructure only through the traits it
//! defines (`SelectionSource`, `PasteInjector`, `CaptureSink`,
//! `HotkeySource`).
//!
//! # Sub-modules
//!
//! - **`network`** – The TCP listener, the per-peer connection handler,
//!   and the shared peer registry that broadcasts capture frames.
//!
//! - **`hotkey`** – Sources of capture/paste trigger events. The shipped
//!   implementation listens for SIGUSR1/SIGUSR2; a `MockHotkeySource` is
//!   provided for tests.
//!
//! - **`clipboard`** – The `arboard`-backed adapter that reads the text
//!   selection and writes pasted text to the system clipboard.
//!
//! - **`storage`** – TOML configuration persistence and the numbered
//!   capture archive.

pub mod clipboard;
pub mod hotkey;
pub mod network;
pub mod storage;
