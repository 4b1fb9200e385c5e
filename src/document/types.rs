//! Core document types
//!
//! Format-agnostic types shared by every reader service.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookFormat {
    Pdf,
    Epub,
    /// Recognized but no reader exists for it
    Txt,
}

impl BookFormat {
    /// Canonical file extension
    pub fn extension(&self) -> &'static str {
        match self {
            BookFormat::Pdf => "pdf",
            BookFormat::Epub => "epub",
            BookFormat::Txt => "txt",
        }
    }

    /// MIME type
    pub fn mime_type(&self) -> &'static str {
        match self {
            BookFormat::Pdf => "application/pdf",
            BookFormat::Epub => "application/epub+zip",
            BookFormat::Txt => "text/plain",
        }
    }
}

impl std::fmt::Display for BookFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Result of a successful open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookContent {
    /// Content hash of the file (hex SHA-256)
    pub id: String,
    /// Path the book was opened from
    pub path: PathBuf,
    /// Document format
    pub format: BookFormat,
    /// Title from metadata, or the file stem
    pub title: String,
    /// Pages (PDF) or chapters (EPUB)
    pub total_pages: usize,
    /// Total words across all pages/chapters
    pub word_count: usize,
    /// Table of contents
    pub toc: Vec<TocEntry>,
    /// Document metadata
    pub metadata: BookMetadata,
}

impl BookContent {
    /// Position at the start of the document
    pub fn start_position(&self) -> ReadingPosition {
        ReadingPosition::start(self.total_pages)
    }
}

/// Location within an open document
///
/// `page` is 1-based and means a page for PDF and a chapter for EPUB.
/// `offset` is a character offset into that page/chapter's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPosition {
    pub page: usize,
    pub total_pages: usize,
    #[serde(default)]
    pub offset: usize,
}

impl ReadingPosition {
    pub fn new(page: usize, total_pages: usize) -> Self {
        Self {
            page,
            total_pages,
            offset: 0,
        }
    }

    pub fn start(total_pages: usize) -> Self {
        Self::new(1, total_pages)
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// 0-based index of the page/chapter
    pub fn index(&self) -> usize {
        self.page.saturating_sub(1)
    }

    pub fn is_first(&self) -> bool {
        self.page <= 1
    }

    pub fn is_last(&self) -> bool {
        self.page >= self.total_pages
    }
}

/// Reader color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderTheme {
    #[default]
    Light,
    Dark,
    Sepia,
}

impl ReaderTheme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "sepia" => Some(Self::Sepia),
            _ => None,
        }
    }
}

/// Page layout mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    #[default]
    Paginated,
    Scroll,
    TwoPage,
}

impl LayoutMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "paginated" => Some(Self::Paginated),
            "scroll" => Some(Self::Scroll),
            "two_page" | "two-page" => Some(Self::TwoPage),
            _ => None,
        }
    }
}

/// Rendering preferences for the open document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderSettings {
    /// Font size in points
    pub font_size: f32,
    /// Line height multiplier
    pub line_height: f32,
    /// Page margin in points
    pub margin: u32,
    pub font_family: Option<String>,
    pub theme: ReaderTheme,
    pub layout: LayoutMode,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            line_height: 1.5,
            margin: 24,
            font_family: None,
            theme: ReaderTheme::default(),
            layout: LayoutMode::default(),
        }
    }
}

/// Document metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    /// Document title
    pub title: Option<String>,
    /// Authors/creators
    pub creators: Vec<Creator>,
    pub publisher: Option<String>,
    /// Language code
    pub language: Option<String>,
    /// Unique identifier (ISBN, DOI, etc.)
    pub identifier: Option<String>,
    pub description: Option<String>,
    /// Publication date
    pub date: Option<String>,
    pub rights: Option<String>,
    /// Subject tags
    pub subjects: Vec<String>,
}

/// Document creator (author, editor, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub name: String,
    /// Role (author, editor, translator, etc.)
    pub role: Option<String>,
}

/// Table of contents entry
///
/// Entries form a flat sequence in document order; `level` gives the
/// nesting depth (0 for top-level entries).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub title: String,
    /// Target page/chapter (1-based)
    pub page: usize,
    pub level: usize,
    /// Original target reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Search match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Page/chapter (1-based)
    pub page: usize,
    /// Character offset of the match within the page/chapter text
    pub offset: usize,
    /// Matched text as it appears in the document
    pub text: String,
    /// Text surrounding the match
    pub snippet: String,
}

/// Search options
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    /// Maximum results (0 = unlimited)
    pub limit: usize,
    /// Characters of context on each side of a match
    pub snippet_radius: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            limit: 0,
            snippet_radius: 40,
        }
    }
}
