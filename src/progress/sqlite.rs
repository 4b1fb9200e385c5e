//! SQLite-backed progress store

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use super::{ProgressStore, StoreError, StoreResult};
use crate::document::ReadingPosition;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS reading_progress (
    id TEXT PRIMARY KEY,
    book_id TEXT NOT NULL UNIQUE,
    page INTEGER NOT NULL,
    total_pages INTEGER NOT NULL,
    offset_chars INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reading_progress_updated ON reading_progress(updated_at);
"#;

/// Stored progress row
#[derive(Debug, Clone, sqlx::FromRow)]
struct ProgressRow {
    book_id: String,
    page: i64,
    total_pages: i64,
    offset_chars: i64,
}

impl ProgressRow {
    fn into_position(self) -> StoreResult<ReadingPosition> {
        let convert = |value: i64, field: &str| {
            usize::try_from(value).map_err(|_| StoreError::Corrupt {
                book_id: self.book_id.clone(),
                details: format!("{} is {}", field, value),
            })
        };
        let page = convert(self.page, "page")?;
        let total_pages = convert(self.total_pages, "total_pages")?;
        let offset = convert(self.offset_chars, "offset_chars")?;
        Ok(ReadingPosition::new(page, total_pages).with_offset(offset))
    }
}

/// Progress store persisted in a `reading_progress` table
#[derive(Debug, Clone)]
pub struct SqliteProgressStore {
    pool: SqlitePool,
}

impl SqliteProgressStore {
    /// Connect to (and create if missing) the database at `database_url`
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // In-memory databases are per connection
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Use an existing pool, creating the schema if needed
    pub async fn with_pool(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::query(SCHEMA_SQL).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ProgressStore for SqliteProgressStore {
    async fn save(&self, book_id: &str, position: &ReadingPosition) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO reading_progress (id, book_id, page, total_pages, offset_chars, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(book_id) DO UPDATE SET
                page = excluded.page,
                total_pages = excluded.total_pages,
                offset_chars = excluded.offset_chars,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(book_id)
        .bind(position.page as i64)
        .bind(position.total_pages as i64)
        .bind(position.offset as i64)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Saved progress for {} at page {}", book_id, position.page);
        Ok(())
    }

    async fn load(&self, book_id: &str) -> StoreResult<Option<ReadingPosition>> {
        let row = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT book_id, page, total_pages, offset_chars
            FROM reading_progress
            WHERE book_id = ?
            "#,
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProgressRow::into_position).transpose()
    }

    async fn delete(&self, book_id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM reading_progress WHERE book_id = ?")
            .bind(book_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_book_ids(&self) -> StoreResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT book_id FROM reading_progress ORDER BY updated_at DESC, book_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
