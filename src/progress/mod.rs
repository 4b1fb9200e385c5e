//! Reading progress persistence
//!
//! The engine only defines the key (`book_id`) and value
//! ([`ReadingPosition`]) of a progress record. Where it lives is up to the
//! [`ProgressStore`] implementation.

mod memory;
mod sqlite;

pub use memory::MemoryProgressStore;
pub use sqlite::SqliteProgressStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::document::ReadingPosition;

/// Progress store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored position for {book_id} is invalid: {details}")]
    Corrupt { book_id: String, details: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Key-value persistence of reading positions
///
/// Retry policy, if any, belongs to the implementation.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Insert or replace the position for a book
    async fn save(&self, book_id: &str, position: &ReadingPosition) -> StoreResult<()>;

    /// Last saved position, if any
    async fn load(&self, book_id: &str) -> StoreResult<Option<ReadingPosition>>;

    /// Forget a book; returns whether a record existed
    async fn delete(&self, book_id: &str) -> StoreResult<bool>;

    /// Books with saved progress
    async fn list_book_ids(&self) -> StoreResult<Vec<String>>;
}
