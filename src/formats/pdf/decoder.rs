//! PDF decoder implementation
//!
//! Implements the `FormatDecoder` seam for PDF documents using lopdf.
//! The parsed object graph stays in memory for the lifetime of the
//! [`PdfDocument`]; page text is extracted on demand.

use std::sync::Arc;

use lopdf::{Dictionary, Object};

use crate::document::{
    BookFormat, BookMetadata, Creator, DecodedDocument, FormatDecoder, TocEntry,
};
use crate::error::{ReaderError, ReaderResult};

/// PDF implementation of FormatDecoder
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfDecoder;

impl FormatDecoder for PdfDecoder {
    fn format(&self) -> BookFormat {
        BookFormat::Pdf
    }

    fn decode(&self, bytes: Vec<u8>) -> ReaderResult<Arc<dyn DecodedDocument>> {
        Ok(Arc::new(PdfDocument::from_bytes(&bytes)?))
    }
}

/// Opened PDF document
pub struct PdfDocument {
    doc: lopdf::Document,
    /// Page numbers in page-tree order
    page_numbers: Vec<u32>,
}

impl PdfDocument {
    /// Parse a PDF from bytes
    pub fn from_bytes(bytes: &[u8]) -> ReaderResult<Self> {
        let doc = lopdf::Document::load_mem(bytes).map_err(|e| ReaderError::pdf(None, e))?;

        if doc.is_encrypted() {
            return Err(ReaderError::pdf(None, "encrypted documents are not supported"));
        }

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(ReaderError::pdf(None, "document has no pages"));
        }

        tracing::debug!("Parsed PDF with {} pages", page_numbers.len());

        Ok(Self { doc, page_numbers })
    }

    fn info_dictionary(&self) -> Option<&Dictionary> {
        match self.doc.trailer.get(b"Info").ok()? {
            Object::Reference(id) => self.doc.get_dictionary(*id).ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }
}

impl DecodedDocument for PdfDocument {
    fn unit_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn unit_text(&self, index: usize) -> ReaderResult<String> {
        let page_number = *self.page_numbers.get(index).ok_or_else(|| {
            ReaderError::content_extraction(Some(index + 1), "page does not exist")
        })?;

        self.doc
            .extract_text(&[page_number])
            .map_err(|e| ReaderError::pdf(Some(index + 1), e))
    }

    fn table_of_contents(&self) -> ReaderResult<Vec<TocEntry>> {
        // Documents without an outline are common; they simply have no TOC
        let toc = match self.doc.get_toc() {
            Ok(toc) => toc,
            Err(e) => {
                tracing::debug!("PDF has no usable outline: {}", e);
                return Ok(Vec::new());
            }
        };

        let base_level = toc.toc.iter().map(|t| t.level).min().unwrap_or(0);
        let page_count = self.unit_count();

        Ok(toc
            .toc
            .into_iter()
            .map(|entry| TocEntry {
                title: if entry.title.trim().is_empty() {
                    "Untitled".to_string()
                } else {
                    entry.title.trim().to_string()
                },
                page: entry.page.clamp(1, page_count),
                level: entry.level - base_level,
                href: Some(format!("page:{}", entry.page)),
            })
            .collect())
    }

    fn metadata(&self) -> ReaderResult<BookMetadata> {
        let Some(info) = self.info_dictionary() else {
            return Ok(BookMetadata::default());
        };

        let get = |key: &[u8]| info_string(info, key);

        let creators = get(b"Author")
            .map(|name| {
                vec![Creator {
                    name,
                    role: Some("author".to_string()),
                }]
            })
            .unwrap_or_default();

        let subjects = get(b"Keywords")
            .map(|k| {
                k.split(&[',', ';'][..])
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(BookMetadata {
            title: get(b"Title"),
            creators,
            publisher: get(b"Creator").or_else(|| get(b"Producer")),
            language: None,
            identifier: None,
            description: get(b"Subject"),
            date: get(b"CreationDate"),
            rights: None,
            subjects,
        })
    }
}

// Helper functions

fn info_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
}

/// Decode a PDF text string (UTF-16BE with BOM, else PDFDocEncoding)
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    // PDFDocEncoding matches Latin-1 for the printable range
    bytes.iter().map(|&b| b as char).collect()
}
