//! Storage infrastructure: configuration persistence and the capture archive.
//!
//! This module is a thin adapter between the application and the file
//! system. The `config` sub-module handles:
//!
//! - Reading the TOML configuration file from the platform-appropriate directory.
//! - Writing changes back to disk.
//! - Providing sensible defaults when the file does not exist yet (first run).
//!
//! The `archive` sub-module writes each successful capture to a numbered
//! text file so a session's captures can be inspected after the fact.
//!
//! Keeping storage concerns here, rather than scattered throughout the
//! application, means the file format can change without touching any
//! other part of the codebase.

pub mod archive;
pub mod config;
