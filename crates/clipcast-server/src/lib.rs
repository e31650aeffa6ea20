//! clipcast-server library entry point.
//!
//! Exposes the full module tree so the integration tests in `tests/`
//! and the `clipcast-server` binary in `main.rs` build against the same
//! code.
//!
//! The layering mirrors the data flow:
//!
//! - [`application`] – capture/paste use cases and the paste buffer,
//!   written against collaborator traits only.
//! - [`infrastructure`] – TCP networking, signal-based hotkeys, the
//!   `arboard` clipboard adapter, and TOML/archive storage.
//! - [`service`] – [`service::ClipCastServer`], which wires the two
//!   layers together and owns startup and shutdown.

pub mod application;
pub mod infrastructure;
pub mod service;
