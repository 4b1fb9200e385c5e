//! Format detection
//!
//! Name-based classification for `detect_format`, plus the magic-byte
//! sniffing used by the header probes.

use std::path::Path;

use super::types::BookFormat;
use crate::error::{ReaderError, ReaderResult};

/// Bytes needed for a header sniff
pub const SNIFF_LEN: usize = 128;

impl BookFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "epub" => Some(Self::Epub),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Detect format from magic bytes
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PDF magic: %PDF
        if bytes.starts_with(b"%PDF") {
            return Some(Self::Pdf);
        }

        // EPUB: a ZIP whose leading `mimetype` entry names epub. Other
        // ZIP-based formats (.docx, .jar, ...) are not EPUBs.
        if bytes.starts_with(b"PK") && bytes.len() > 30 {
            let head = &bytes[..bytes.len().min(SNIFF_LEN)];
            if head.windows(4).any(|w| w == b"epub") {
                return Some(Self::Epub);
            }
        }

        None
    }
}

/// Classify a path by its extension
///
/// Only `.pdf` and `.epub` (any case) succeed. Anything else fails with the
/// lower-cased extension attached. The file is never touched.
pub fn detect_format(path: impl AsRef<Path>) -> ReaderResult<BookFormat> {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match BookFormat::from_extension(&extension) {
        Some(format @ (BookFormat::Pdf | BookFormat::Epub)) => Ok(format),
        _ => Err(ReaderError::unsupported_format(extension)),
    }
}
