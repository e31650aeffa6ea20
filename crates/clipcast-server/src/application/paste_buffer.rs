//! Versioned storage for the most recent text received from a peer.
//!
//! Every `TextForPaste` frame that arrives over the network replaces the
//! buffered text wholesale. Consumers (the paste injector, diagnostics)
//! read an immutable snapshot and can compare version numbers to tell
//! whether anything changed since they last looked.
//!
//! Writers never block readers for longer than an `Arc` swap: the text is
//! frozen into an [`PasteSnapshot`] before the lock is taken, so the
//! critical section is two pointer-sized operations. A reader that loaded
//! a snapshot just before a publish simply keeps its (fully intact) older
//! text. Torn reads are impossible by construction.

use std::sync::{Arc, RwLock};

// ── Snapshot ────────────────────────────────────────────────────────────────

/// One immutable generation of the paste buffer.
#[derive(Debug)]
pub struct PasteSnapshot {
    /// Strictly increasing generation number. Starts at 0 for the empty
    /// initial snapshot; the first publish produces version 1.
    pub version: u64,
    /// The complete replacement text for this generation.
    pub text: String,
}

// ── Buffer ──────────────────────────────────────────────────────────────────

/// Shared, versioned slot holding the latest peer-supplied text.
///
/// Cloneable via `Arc<PasteBuffer>`; all clones observe the same sequence
/// of generations.
#[derive(Debug)]
pub struct PasteBuffer {
    slot: RwLock<Arc<PasteSnapshot>>,
}

impl PasteBuffer {
    /// Creates a buffer holding the empty initial snapshot (version 0).
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(Arc::new(PasteSnapshot {
                version: 0,
                text: String::new(),
            })),
        }
    }

    /// Replaces the buffered text and returns the version assigned to it.
    ///
    /// The version is allocated inside the write critical section, so
    /// versions observed through [`latest`](Self::latest) are strictly
    /// increasing and each version corresponds to exactly one text. When
    /// two publishes race, whichever acquires the write lock last wins.
    pub fn publish(&self, text: String) -> u64 {
        let mut slot = self.slot.write().expect("lock poisoned");
        let version = slot.version + 1;
        *slot = Arc::new(PasteSnapshot { version, text });
        version
    }

    /// Returns the current snapshot. Cheap: clones an `Arc`, never copies
    /// the text.
    pub fn latest(&self) -> Arc<PasteSnapshot> {
        Arc::clone(&self.slot.read().expect("lock poisoned"))
    }
}

impl Default for PasteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
