//! Reader error types
//!
//! One closed failure taxonomy for every layer of the engine. Each variant
//! carries a human-readable `message` (its `Display` output) together with
//! structured context fields for programmatic handling.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used for every operation attempted while no book is open
pub const NO_BOOK_OPEN: &str = "No book is currently open";

/// Direction of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationDirection {
    Forward,
    Backward,
    Jump,
}

impl fmt::Display for NavigationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Jump => "jump",
        };
        f.write_str(name)
    }
}

/// Progress store operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressOperation {
    Save,
    Load,
}

impl fmt::Display for ProgressOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Save => f.write_str("save"),
            Self::Load => f.write_str("load"),
        }
    }
}

/// Unified reader error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReaderError {
    /// The document could not be opened, or no document is open
    #[error("{message}")]
    BookOpen {
        message: String,
        path: Option<PathBuf>,
    },

    /// File name or requested format has no reader
    #[error("{message}")]
    UnsupportedFormat { message: String, extension: String },

    /// Generic I/O or operation failure
    #[error("{message}")]
    ReaderFile { message: String, operation: String },

    /// PDF structural failure
    #[error("{message}")]
    PdfReader { message: String, page: Option<usize> },

    /// EPUB structural failure
    #[error("{message}")]
    EpubReader {
        message: String,
        chapter: Option<usize>,
    },

    /// Out-of-bounds navigation
    #[error("{message}")]
    Navigation {
        message: String,
        requested_page: usize,
        total_pages: usize,
        direction: NavigationDirection,
    },

    /// Decoder fault while scanning for a query
    #[error("{message}")]
    Search {
        message: String,
        query: String,
        scope: String,
        details: String,
    },

    /// Page/chapter content could not be produced
    #[error("{message}")]
    ContentExtraction {
        message: String,
        page: Option<usize>,
        details: String,
    },

    /// Rejected reader settings
    #[error("{message}")]
    Settings { message: String, setting: String },

    /// Progress store failure
    #[error("{message}")]
    Progress {
        message: String,
        operation: ProgressOperation,
        book_id: String,
        details: String,
    },

    /// Document exceeds the configured memory budget
    #[error("{message}")]
    Memory {
        message: String,
        requested_bytes: u64,
        limit_bytes: u64,
    },
}

/// Result type alias for reader operations
pub type ReaderResult<T> = std::result::Result<T, ReaderError>;

/// Alias for ReaderResult
pub type Result<T> = ReaderResult<T>;

impl ReaderError {
    /// The uniform failure for operations attempted in the idle state
    pub fn no_book_open() -> Self {
        Self::BookOpen {
            message: NO_BOOK_OPEN.to_string(),
            path: None,
        }
    }

    pub fn book_open(path: &Path, details: impl fmt::Display) -> Self {
        Self::BookOpen {
            message: format!("Failed to open {}: {}", path.display(), details),
            path: Some(path.to_path_buf()),
        }
    }

    pub fn unsupported_format(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        let message = if extension.is_empty() {
            "Unsupported format: file has no extension".to_string()
        } else {
            format!("Unsupported format: .{}", extension)
        };
        Self::UnsupportedFormat { message, extension }
    }

    pub fn reader_file(operation: impl Into<String>, details: impl fmt::Display) -> Self {
        let operation = operation.into();
        Self::ReaderFile {
            message: format!("{} failed: {}", operation, details),
            operation,
        }
    }

    pub fn pdf(page: Option<usize>, details: impl fmt::Display) -> Self {
        let message = match page {
            Some(page) => format!("PDF error on page {}: {}", page, details),
            None => format!("PDF error: {}", details),
        };
        Self::PdfReader { message, page }
    }

    pub fn epub(chapter: Option<usize>, details: impl fmt::Display) -> Self {
        let message = match chapter {
            Some(chapter) => format!("EPUB error in chapter {}: {}", chapter, details),
            None => format!("EPUB error: {}", details),
        };
        Self::EpubReader { message, chapter }
    }

    pub fn navigation(
        requested_page: usize,
        total_pages: usize,
        direction: NavigationDirection,
    ) -> Self {
        Self::Navigation {
            message: format!(
                "Cannot navigate {} to page {} (document has {} pages)",
                direction, requested_page, total_pages
            ),
            requested_page,
            total_pages,
            direction,
        }
    }

    pub fn search(
        query: impl Into<String>,
        scope: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let (query, scope, details) = (query.into(), scope.into(), details.into());
        Self::Search {
            message: format!("Search for '{}' failed in {}: {}", query, scope, details),
            query,
            scope,
            details,
        }
    }

    pub fn content_extraction(page: Option<usize>, details: impl Into<String>) -> Self {
        let details = details.into();
        let message = match page {
            Some(page) => format!("Could not extract content of page {}: {}", page, details),
            None => format!("Could not extract content: {}", details),
        };
        Self::ContentExtraction {
            message,
            page,
            details,
        }
    }

    pub fn settings(setting: impl Into<String>, details: impl fmt::Display) -> Self {
        let setting = setting.into();
        Self::Settings {
            message: format!("Invalid setting '{}': {}", setting, details),
            setting,
        }
    }

    pub fn progress(
        operation: ProgressOperation,
        book_id: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let (book_id, details) = (book_id.into(), details.into());
        Self::Progress {
            message: format!(
                "Failed to {} progress for book {}: {}",
                operation, book_id, details
            ),
            operation,
            book_id,
            details,
        }
    }

    pub fn memory(requested_bytes: u64, limit_bytes: u64) -> Self {
        Self::Memory {
            message: format!(
                "Document of {} bytes exceeds the {} byte limit",
                requested_bytes, limit_bytes
            ),
            requested_bytes,
            limit_bytes,
        }
    }

    /// Human-readable message
    pub fn message(&self) -> &str {
        match self {
            Self::BookOpen { message, .. }
            | Self::UnsupportedFormat { message, .. }
            | Self::ReaderFile { message, .. }
            | Self::PdfReader { message, .. }
            | Self::EpubReader { message, .. }
            | Self::Navigation { message, .. }
            | Self::Search { message, .. }
            | Self::ContentExtraction { message, .. }
            | Self::Settings { message, .. }
            | Self::Progress { message, .. }
            | Self::Memory { message, .. } => message,
        }
    }

    /// Stable machine-readable tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BookOpen { .. } => "book_open",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::ReaderFile { .. } => "reader_file",
            Self::PdfReader { .. } => "pdf_reader",
            Self::EpubReader { .. } => "epub_reader",
            Self::Navigation { .. } => "navigation",
            Self::Search { .. } => "search",
            Self::ContentExtraction { .. } => "content_extraction",
            Self::Settings { .. } => "settings",
            Self::Progress { .. } => "progress",
            Self::Memory { .. } => "memory",
        }
    }

    /// True for the idle-state guard failure
    pub fn is_no_book_open(&self) -> bool {
        matches!(self, Self::BookOpen { message, path: None } if message == NO_BOOK_OPEN)
    }
}

impl From<std::io::Error> for ReaderError {
    fn from(err: std::io::Error) -> Self {
        ReaderError::reader_file("io", err)
    }
}

impl From<tokio::task::JoinError> for ReaderError {
    fn from(err: tokio::task::JoinError) -> Self {
        ReaderError::reader_file("task", err)
    }
}
