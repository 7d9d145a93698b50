//! JSON file backed library
//!
//! The file holds `{ "items": [ ... ] }`. Every persist rewrites the whole
//! file through a temporary sibling and a rename.

use async_trait::async_trait;
use audience_tagger_domain::{
    ItemQuery, ItemRepository, MediaItem, RepositoryError, UpdateReason,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::library_memory::matches_query;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    items: Vec<MediaItem>,
}

/// Item repository stored in a single JSON file
pub struct JsonLibrary {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLibrary {
    /// Open an existing library file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();

        if !path.is_file() {
            return Err(RepositoryError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Library file not found: {}", path.display()),
            )));
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Load every item in file order
    pub async fn load(&self) -> Result<Vec<MediaItem>, RepositoryError> {
        Ok(self.read_file().await?.items)
    }

    async fn read_file(&self) -> Result<LibraryFile, RepositoryError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        serde_json::from_str(&content).map_err(|e| {
            RepositoryError::Serialization(format!("{}: {}", self.path.display(), e))
        })
    }

    async fn write_file(&self, file: &LibraryFile) -> Result<(), RepositoryError> {
        let content = serde_json::to_string_pretty(file)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for JsonLibrary {
    async fn query(&self, query: ItemQuery) -> Result<Vec<MediaItem>, RepositoryError> {
        let file = self.read_file().await?;
        Ok(file
            .items
            .into_iter()
            .filter(|item| matches_query(item, &query))
            .collect())
    }

    async fn persist(&self, item: &MediaItem, reason: UpdateReason) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;

        let mut file = self.read_file().await?;
        let existing = file
            .items
            .iter_mut()
            .find(|existing| existing.id == item.id)
            .ok_or_else(|| RepositoryError::NotFound(item.id.to_string()))?;
        *existing = item.clone();

        self.write_file(&file).await?;

        tracing::debug!(item_id = %item.id, reason = ?reason, path = %self.path.display(), "Saved item");
        Ok(())
    }
}
