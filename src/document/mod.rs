//! Unified document abstraction
//!
//! This module provides format-agnostic types and the decoder seam shared by
//! the PDF and EPUB readers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  ReaderRepository                       │
//! │        (one active ReaderService at a time)             │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!           ┌────────────────┴────────────────┐
//!           ▼                                 ▼
//!   ┌──────────────────┐            ┌──────────────────┐
//!   │ PdfReaderService │            │ EpubReaderService│
//!   └──────────────────┘            └──────────────────┘
//!           │                                 │
//!           ▼                                 ▼
//!   ┌──────────────────┐            ┌──────────────────┐
//!   │ PdfDecoder       │            │ EpubDecoder      │
//!   │ (FormatDecoder)  │            │ (FormatDecoder)  │
//!   └──────────────────┘            └──────────────────┘
//! ```

mod detect;
mod text;
mod traits;
mod types;

pub use detect::{detect_format, SNIFF_LEN};
pub use text::{char_len, count_words, find_matches};
pub use traits::{DecodedDocument, FormatDecoder, ProgressWeighting};
pub use types::{
    BookContent, BookFormat, BookMetadata, Creator, LayoutMode, ReaderSettings, ReaderTheme,
    ReadingPosition, SearchOptions, SearchResult, TocEntry,
};
