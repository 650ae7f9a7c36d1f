//! Persistence for the net-worth history log.

mod json_file;
mod memory;

pub use json_file::JsonFileHistoryStore;
pub use memory::MemoryHistoryStore;

use std::path::PathBuf;

use crate::models::HistoryEntry;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to read history from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write history to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history file {path:?} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize history: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Append-only log of net-worth observations.
///
/// Callers serialize appends; implementations do not guard against two
/// concurrent writers.
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    /// Add `entry` at the end of the log.
    async fn append(&self, entry: &HistoryEntry) -> Result<(), PersistenceError>;

    /// Every entry in append order. An absent log reads as empty.
    async fn read_all(&self) -> Result<Vec<HistoryEntry>, PersistenceError>;
}
