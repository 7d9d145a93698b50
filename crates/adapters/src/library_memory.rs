//! In-memory library for testing and embedding

use async_trait::async_trait;
use audience_tagger_domain::{
    ItemQuery, ItemRepository, MediaItem, RepositoryError, UpdateReason,
};
use std::sync::RwLock;

/// In-memory item repository
pub struct InMemoryLibrary {
    items: RwLock<Vec<MediaItem>>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::with_items(vec![])
    }

    pub fn with_items(items: Vec<MediaItem>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }

    /// Snapshot all items, including ones a query would filter out
    pub fn items(&self) -> Result<Vec<MediaItem>, RepositoryError> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.clone())
    }
}

impl Default for InMemoryLibrary {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> RepositoryError {
    RepositoryError::Io(std::io::Error::other(e.to_string()))
}

/// Whether an item satisfies a library query
pub(crate) fn matches_query(item: &MediaItem, query: &ItemQuery) -> bool {
    if item.kind != query.kind {
        return false;
    }
    if query.exclude_virtual && item.is_virtual {
        return false;
    }
    query.recursive || item.parent_id.is_none()
}

#[async_trait]
impl ItemRepository for InMemoryLibrary {
    async fn query(&self, query: ItemQuery) -> Result<Vec<MediaItem>, RepositoryError> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items
            .iter()
            .filter(|item| matches_query(item, &query))
            .cloned()
            .collect())
    }

    async fn persist(&self, item: &MediaItem, _reason: UpdateReason) -> Result<(), RepositoryError> {
        let mut items = self.items.write().map_err(poisoned)?;
        let existing = items
            .iter_mut()
            .find(|existing| existing.id == item.id)
            .ok_or_else(|| RepositoryError::NotFound(item.id.to_string()))?;
        *existing = item.clone();
        Ok(())
    }
}
