//! Reader services
//!
//! A [`ReaderService`] is the uniform capability set every format exposes:
//! open/close, position and settings, navigation, search, structural
//! accessors, progress persistence, and three live streams. One generic
//! adapter, [`FormatReaderService`], implements it on top of any
//! [`FormatDecoder`](crate::document::FormatDecoder).

mod adapter;
mod session;
mod streams;

pub use adapter::FormatReaderService;
pub use session::UnitStats;
pub use streams::{SessionChannels, StreamHub};

use std::path::Path;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::document::{
    BookContent, BookFormat, BookMetadata, ReaderSettings, ReadingPosition, SearchResult,
    TocEntry,
};
use crate::error::Result;

/// Per-format reading capability
///
/// Every operation other than `open_book`, `close_book`, `force_close`,
/// `is_format_supported`, `dispose` and the streams requires an open book and
/// fails with [`ReaderError::no_book_open`](crate::error::ReaderError::no_book_open)
/// otherwise. Streams of an idle service complete immediately.
#[async_trait]
pub trait ReaderService: Send + Sync {
    /// Format this service decodes
    fn format(&self) -> BookFormat;

    fn is_open(&self) -> bool;

    /// Open a book, replacing any book this service already holds
    async fn open_book(&mut self, path: &Path, format: BookFormat) -> Result<BookContent>;

    /// Release the open book; `Ok(true)` when nothing is open
    async fn close_book(&mut self) -> Result<bool>;

    /// Release the open book without saving its position; never fails
    fn force_close(&mut self);

    fn current_position(&self) -> Result<ReadingPosition>;

    fn update_position(&mut self, position: ReadingPosition) -> Result<ReadingPosition>;

    fn settings(&self) -> Result<ReaderSettings>;

    fn update_settings(&mut self, settings: ReaderSettings) -> Result<()>;

    /// Jump to a 1-based page/chapter
    fn go_to_page(&mut self, page: usize) -> Result<ReadingPosition>;

    fn next_page(&mut self) -> Result<ReadingPosition>;

    fn previous_page(&mut self) -> Result<ReadingPosition>;

    /// Matches in document order; an empty query yields no matches
    async fn search_text(&self, query: &str, case_sensitive: bool) -> Result<Vec<SearchResult>>;

    /// Text of a 1-based page/chapter
    async fn page_text(&self, page: usize) -> Result<String>;

    async fn table_of_contents(&self) -> Result<Vec<TocEntry>>;

    async fn book_metadata(&self) -> Result<BookMetadata>;

    /// Fraction of the book read at `position`, in `[0, 1]`
    fn calculate_progress(&self, position: &ReadingPosition) -> Result<f64>;

    /// Whole minutes left after `position`
    ///
    /// # Panics
    ///
    /// Panics if `words_per_minute` is zero.
    fn estimate_remaining_time(
        &self,
        position: &ReadingPosition,
        words_per_minute: u32,
    ) -> Result<u64>;

    /// Cheap header sniff; never fails
    async fn is_format_supported(&self, path: &Path) -> bool;

    async fn save_progress(&self, book_id: &str, position: &ReadingPosition) -> Result<()>;

    async fn load_progress(&self, book_id: &str) -> Result<Option<ReadingPosition>>;

    fn position_stream(&self) -> BoxStream<'static, ReadingPosition>;

    fn settings_stream(&self) -> BoxStream<'static, ReaderSettings>;

    /// Open progress of the current book, replayed from `0.0`
    fn loading_progress_stream(&self) -> BoxStream<'static, f64>;

    /// Final teardown
    async fn dispose(&mut self);
}
