//! On-disk archive of captured text.
//!
//! Each successful capture lands in its own numbered file under the
//! configured archive directory: `capture_1.txt`, `capture_2.txt` and so
//! on. The counter is per-run; a restart begins again at 1 and overwrites
//! files from the previous run.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::application::capture::CaptureSink;

/// Error type for archive setup.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive directory could not be created.
    #[error("failed to create archive directory {path}: {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes each capture to a numbered text file.
///
/// Construction is fatal on failure (a misconfigured archive directory
/// should stop startup), but individual write failures afterwards are
/// soft: the worker logs them and the broadcast still goes out.
#[derive(Debug)]
pub struct FileCaptureSink {
    dir: PathBuf,
    next_index: AtomicU64,
}

impl FileCaptureSink {
    /// Creates the sink, making the archive directory if needed.
    pub fn new(dir: PathBuf) -> Result<Self, ArchiveError> {
        std::fs::create_dir_all(&dir).map_err(|source| ArchiveError::CreateDirFailed {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            next_index: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl CaptureSink for FileCaptureSink {
    async fn persist_captured_text(&self, text: &str) -> Result<(), String> {
        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        let path = self.dir.join(format!("capture_{index}.txt"));

        tokio::fs::write(&path, text)
            .await
            .map_err(|e| format!("could not write {}: {e}", path.display()))?;

        debug!("archived {} bytes to {}", text.len(), path.display());
        Ok(())
    }
}
