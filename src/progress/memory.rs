//! In-process progress store

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ProgressStore, StoreResult};
use crate::document::ReadingPosition;

/// Progress store backed by a map; contents are lost on drop
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    positions: RwLock<HashMap<String, ReadingPosition>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.positions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.read().is_empty()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn save(&self, book_id: &str, position: &ReadingPosition) -> StoreResult<()> {
        self.positions.write().insert(book_id.to_string(), *position);
        Ok(())
    }

    async fn load(&self, book_id: &str) -> StoreResult<Option<ReadingPosition>> {
        Ok(self.positions.read().get(book_id).copied())
    }

    async fn delete(&self, book_id: &str) -> StoreResult<bool> {
        Ok(self.positions.write().remove(book_id).is_some())
    }

    async fn list_book_ids(&self) -> StoreResult<Vec<String>> {
        let mut ids: Vec<String> = self.positions.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
