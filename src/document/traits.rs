//! Document traits
//!
//! Format-agnostic decoder capability. A decoder turns file bytes into a
//! [`DecodedDocument`]; everything above this seam (positions, settings,
//! streams, progress) is shared by all formats.

use std::sync::Arc;

use super::types::{BookFormat, BookMetadata, TocEntry};
use crate::error::ReaderResult;

/// How reading progress is weighted for a format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressWeighting {
    /// `page / total_pages`
    PageCount,
    /// Share of words up to and including the current chapter
    WordCount,
}

/// Format decoder
///
/// Implementations are stateless factories; all per-document state lives in
/// the returned [`DecodedDocument`] and is released when it is dropped.
pub trait FormatDecoder: Send + Sync + 'static {
    /// Format handled by this decoder
    fn format(&self) -> BookFormat;

    /// Cheap header check over the first bytes of a file
    fn sniff(&self, header: &[u8]) -> bool {
        BookFormat::from_magic_bytes(header) == Some(self.format())
    }

    /// Parse a complete document
    fn decode(&self, bytes: Vec<u8>) -> ReaderResult<Arc<dyn DecodedDocument>>;

    fn progress_weighting(&self) -> ProgressWeighting {
        ProgressWeighting::PageCount
    }
}

/// An opened document
///
/// Unit indices are 0-based (pages for PDF, spine chapters for EPUB).
pub trait DecodedDocument: Send + Sync {
    /// Number of pages/chapters
    fn unit_count(&self) -> usize;

    /// Plain text of one page/chapter
    fn unit_text(&self, index: usize) -> ReaderResult<String>;

    /// Table of contents in document order
    fn table_of_contents(&self) -> ReaderResult<Vec<TocEntry>>;

    /// Document metadata
    fn metadata(&self) -> ReaderResult<BookMetadata>;
}
