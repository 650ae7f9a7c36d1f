use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::models::HistoryEntry;

use super::{HistoryStore, PersistenceError};

/// History kept as a single pretty-printed JSON array.
///
/// Every append reads the whole document, pushes one entry and rewrites the
/// file through a sibling `.tmp` file so readers never see a torn write.
#[derive(Debug, Clone)]
pub struct JsonFileHistoryStore {
    path: PathBuf,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn ensure_dir(&self) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| PersistenceError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        Ok(())
    }

    async fn read_entries(&self) -> Result<Vec<HistoryEntry>, PersistenceError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|source| PersistenceError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_entries(&self, entries: &[HistoryEntry]) -> Result<(), PersistenceError> {
        self.ensure_dir().await?;
        let content = serde_json::to_string_pretty(entries).map_err(PersistenceError::Serialize)?;

        let temp = self.temp_path();
        fs::write(&temp, content)
            .await
            .map_err(|source| PersistenceError::Write {
                path: temp.clone(),
                source,
            })?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|source| PersistenceError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

#[async_trait::async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn append(&self, entry: &HistoryEntry) -> Result<(), PersistenceError> {
        let mut entries = self.read_entries().await?;
        entries.push(entry.clone());
        self.write_entries(&entries).await?;
        debug!(path = ?self.path, entries = entries.len(), "history appended");
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<HistoryEntry>, PersistenceError> {
        self.read_entries().await
    }
}
