//! TCP networking: listener, per-peer sessions, and the broadcast registry.
//!
//! The pieces fit together like this:
//!
//! 1. [`listener::bind_listener`] binds the configured address and
//!    [`listener::accept_loop`] accepts peers until shutdown.
//! 2. Each accepted socket is handed to [`connection::handle_connection`]
//!    in its own Tokio task. The handler registers the write half with
//!    the shared [`registry::PeerRegistry`] and reads frames until the
//!    peer disconnects or shutdown is requested.
//! 3. The capture worker broadcasts through the registry; write failures
//!    mark peers dead and the worker reaps them.
//!
//! One slow or hung peer never blocks the others: broadcast writes happen
//! outside the registry lock, per-peer, against a snapshot of handles.

pub mod connection;
pub mod listener;
pub mod registry;
