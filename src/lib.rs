//! Amnesia Reader
//!
//! Multi-format (PDF/EPUB) document reading engine. The
//! [`ReaderRepository`] is the only entry point applications should use;
//! it keeps at most one book open and routes every call to the reader
//! service for that book's format.
//!
//! # Modules
//!
//! - `document`: Format-agnostic types, detection, and the decoder seam
//! - `formats`: PDF (lopdf) and EPUB (zip + quick-xml) decoders
//! - `service`: Per-format reader services and their event streams
//! - `progress`: Reading position persistence
//! - `repository`: The facade and its open/idle state machine
//! - `config`: Environment-driven configuration
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use amnesia_reader::{MemoryProgressStore, ReaderConfig, ReaderRepository};
//!
//! # async fn run() -> amnesia_reader::Result<()> {
//! let mut reader = ReaderRepository::with_config(
//!     ReaderConfig::default(),
//!     Arc::new(MemoryProgressStore::new()),
//! );
//! let book = reader.open_book("moby-dick.epub", None).await?;
//! let position = reader.go_to_page(3)?;
//! println!("{}: {:.0}%", book.title, reader.calculate_progress(&position)? * 100.0);
//! reader.close_book().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod formats;
pub mod progress;
pub mod repository;
pub mod service;

#[cfg(test)]
mod testing;

pub use config::{ReaderConfig, SearchConfig};
pub use document::{
    BookContent, BookFormat, BookMetadata, ReaderSettings, ReadingPosition, SearchResult,
    TocEntry,
};
pub use error::{ReaderError, ReaderResult, Result};
pub use progress::{MemoryProgressStore, ProgressStore, SqliteProgressStore, StoreError};
pub use repository::ReaderRepository;
pub use service::ReaderService;
