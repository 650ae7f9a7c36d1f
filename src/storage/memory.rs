//! In-memory history store for testing.

use tokio::sync::Mutex;

use crate::models::HistoryEntry;

use super::{HistoryStore, PersistenceError};

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<HistoryEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait::async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, entry: &HistoryEntry) -> Result<(), PersistenceError> {
        self.entries.lock().await.push(entry.clone());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<HistoryEntry>, PersistenceError> {
        Ok(self.entries.lock().await.clone())
    }
}
