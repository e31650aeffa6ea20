//! Application layer use cases for the broadcast engine.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure protocol rules, which live in `clipcast-core`) and the
//! infrastructure (sockets, signals, the OS clipboard, the file system).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** the capture/broadcast/paste flows end to end.
//! - **Depend on abstractions** (traits) rather than concrete
//!   implementations, so the OS-facing pieces can be swapped for test
//!   doubles without changing this code.
//! - **Contain no OS calls, no network I/O, no file system access.**
//!
//! # Sub-modules
//!
//! - **`capture`** – The debounced capture worker: waits for a trigger,
//!   reads the selection through [`capture::SelectionSource`], optionally
//!   archives it, and broadcasts it to every connected peer. This is the
//!   heart of the engine.
//!
//! - **`hotkeys`** – The hotkey pump: turns capture events into worker
//!   triggers and paste events into injections of the latest received
//!   text.
//!
//! - **`paste_buffer`** – The versioned latest-value slot holding the
//!   most recent text received from any peer.

pub mod capture;
pub mod hotkeys;
pub mod paste_buffer;
