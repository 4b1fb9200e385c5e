//! EPUB decoder implementation
//!
//! Implements the `FormatDecoder` seam for EPUB documents. The ZIP container
//! is read once at decode time; chapter texts, TOC, and metadata are kept in
//! memory and the archive itself is released immediately.
//!
//! # Resource Resolution
//!
//! Paths are matched against archive entries with the same fuzzy rules used
//! for resource extraction:
//! 1. Exact match
//! 2. Case-insensitive match
//! 3. Suffix match (entry ends with the requested path)

use std::io::{Cursor, Read};
use std::sync::Arc;

use zip::ZipArchive;

use super::navigation::{parse_nav, parse_ncx, NavPoint};
use super::package::{parent_dir, parse_container, parse_opf, Package};
use super::xhtml::{extract_text, first_line};
use crate::document::{
    BookFormat, BookMetadata, DecodedDocument, FormatDecoder, ProgressWeighting, TocEntry,
};
use crate::error::{ReaderError, ReaderResult};

const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Maximum characters of a fallback TOC title
const FALLBACK_TITLE_CHARS: usize = 60;

/// EPUB implementation of FormatDecoder
#[derive(Debug, Clone, Copy, Default)]
pub struct EpubDecoder;

impl FormatDecoder for EpubDecoder {
    fn format(&self) -> BookFormat {
        BookFormat::Epub
    }

    fn decode(&self, bytes: Vec<u8>) -> ReaderResult<Arc<dyn DecodedDocument>> {
        Ok(Arc::new(EpubDocument::from_bytes(bytes)?))
    }

    fn progress_weighting(&self) -> ProgressWeighting {
        ProgressWeighting::WordCount
    }
}

/// Spine chapter with its extracted text
#[derive(Debug, Clone)]
struct Chapter {
    path: String,
    text: String,
}

/// Opened EPUB document
#[derive(Debug)]
pub struct EpubDocument {
    metadata: BookMetadata,
    chapters: Vec<Chapter>,
    toc: Vec<TocEntry>,
}

type Archive = ZipArchive<Cursor<Vec<u8>>>;

impl EpubDocument {
    /// Parse an EPUB from bytes
    pub fn from_bytes(bytes: Vec<u8>) -> ReaderResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ReaderError::epub(None, format!("invalid container: {}", e)))?;

        let container = read_entry(&mut archive, CONTAINER_PATH)?;
        let opf_path = parse_container(&container)?;
        let opf = read_entry(&mut archive, &opf_path)?;
        let package = parse_opf(&opf, &opf_path)?;

        let order = package.reading_order();
        if order.is_empty() {
            return Err(ReaderError::epub(None, "spine contains no chapters"));
        }

        let mut chapters = Vec::with_capacity(order.len());
        for (index, item) in order.iter().enumerate() {
            let chapter = index + 1;
            let xhtml = read_entry(&mut archive, &item.path).map_err(|e| {
                ReaderError::epub(Some(chapter), e.message().to_string())
            })?;
            let text = extract_text(&xhtml).map_err(|e| ReaderError::epub(Some(chapter), e))?;
            chapters.push(Chapter {
                path: item.path.clone(),
                text,
            });
        }

        let nav_points = read_navigation(&mut archive, &package);
        let toc = map_toc(&nav_points, &chapters);

        tracing::debug!(
            "Parsed EPUB '{}' with {} chapters and {} TOC entries",
            package.metadata.title.as_deref().unwrap_or("untitled"),
            chapters.len(),
            toc.len()
        );

        Ok(Self {
            metadata: package.metadata,
            chapters,
            toc,
        })
    }
}

impl DecodedDocument for EpubDocument {
    fn unit_count(&self) -> usize {
        self.chapters.len()
    }

    fn unit_text(&self, index: usize) -> ReaderResult<String> {
        self.chapters
            .get(index)
            .map(|c| c.text.clone())
            .ok_or_else(|| ReaderError::content_extraction(Some(index + 1), "chapter does not exist"))
    }

    fn table_of_contents(&self) -> ReaderResult<Vec<TocEntry>> {
        Ok(self.toc.clone())
    }

    fn metadata(&self) -> ReaderResult<BookMetadata> {
        Ok(self.metadata.clone())
    }
}

// Helper functions

/// Read a text entry from the archive with fuzzy path matching
fn read_entry(archive: &mut Archive, path: &str) -> ReaderResult<String> {
    let name = find_entry_name(archive, path).ok_or_else(|| {
        ReaderError::epub(None, format!("'{}' not found in archive", path))
    })?;

    let mut file = archive
        .by_name(&name)
        .map_err(|e| ReaderError::epub(None, format!("failed to read '{}': {}", name, e)))?;

    let mut content = Vec::new();
    file.read_to_end(&mut content)
        .map_err(|e| ReaderError::epub(None, format!("failed to read '{}': {}", name, e)))?;

    let text = String::from_utf8_lossy(&content);
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

fn find_entry_name(archive: &Archive, path: &str) -> Option<String> {
    let names: Vec<&str> = archive.file_names().collect();

    if names.contains(&path) {
        return Some(path.to_string());
    }

    let lower = path.to_lowercase();
    if let Some(name) = names.iter().find(|n| n.to_lowercase() == lower) {
        return Some(name.to_string());
    }

    let suffix = format!("/{}", lower);
    names
        .iter()
        .find(|n| n.to_lowercase().ends_with(&suffix))
        .map(|n| n.to_string())
}

/// NAV first, then NCX; an unreadable TOC document degrades to no TOC
fn read_navigation(archive: &mut Archive, package: &Package) -> Vec<NavPoint> {
    if let Some(nav) = package.nav_item() {
        match read_entry(archive, &nav.path).and_then(|x| parse_nav(&x, parent_dir(&nav.path))) {
            Ok(points) if !points.is_empty() => return points,
            Ok(_) => {}
            Err(e) => tracing::warn!("Ignoring navigation document {}: {}", nav.path, e),
        }
    }

    if let Some(ncx) = package.ncx_item() {
        match read_entry(archive, &ncx.path).and_then(|x| parse_ncx(&x, parent_dir(&ncx.path))) {
            Ok(points) => return points,
            Err(e) => tracing::warn!("Ignoring NCX {}: {}", ncx.path, e),
        }
    }

    Vec::new()
}

/// Map navigation targets onto chapters; fall back to one entry per chapter
fn map_toc(points: &[NavPoint], chapters: &[Chapter]) -> Vec<TocEntry> {
    let mut toc: Vec<TocEntry> = points
        .iter()
        .filter_map(|point| {
            let target = point.path.to_lowercase();
            let index = chapters
                .iter()
                .position(|c| c.path.to_lowercase() == target);
            if index.is_none() {
                tracing::debug!("TOC entry '{}' targets no chapter ({})", point.title, point.href);
            }
            index.map(|index| TocEntry {
                title: point.title.clone(),
                page: index + 1,
                level: point.level,
                href: Some(point.href.clone()),
            })
        })
        .collect();

    if toc.is_empty() {
        toc = chapters
            .iter()
            .enumerate()
            .map(|(index, chapter)| TocEntry {
                title: first_line(&chapter.text, FALLBACK_TITLE_CHARS)
                    .unwrap_or_else(|| format!("Chapter {}", index + 1)),
                page: index + 1,
                level: 0,
                href: Some(chapter.path.clone()),
            })
            .collect();
    }

    toc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{build_epub, build_epub_ncx, EpubFixture};

    #[test]
    fn test_decode_chapters_in_spine_order() {
        let bytes = build_epub(&EpubFixture::sample(5));
        let doc = EpubDecoder.decode(bytes).unwrap();
        assert_eq!(doc.unit_count(), 5);
        assert!(doc.unit_text(2).unwrap().starts_with("Chapter 3"));
    }

    #[test]
    fn test_nav_toc_maps_to_chapters() {
        let bytes = build_epub(&EpubFixture::sample(3));
        let doc = EpubDecoder.decode(bytes).unwrap();
        let toc = doc.table_of_contents().unwrap();
        let pages: Vec<usize> = toc.iter().map(|t| t.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
        assert_eq!(toc[1].title, "Chapter 2");
    }

    #[test]
    fn test_ncx_toc() {
        let bytes = build_epub_ncx(&EpubFixture::sample(2));
        let doc = EpubDecoder.decode(bytes).unwrap();
        let toc = doc.table_of_contents().unwrap();
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].page, 1);
    }

    #[test]
    fn test_metadata() {
        let bytes = build_epub(&EpubFixture::sample(1));
        let doc = EpubDecoder.decode(bytes).unwrap();
        let metadata = doc.metadata().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Sample Book"));
        assert_eq!(metadata.creators[0].name, "Jane Doe");
    }

    #[test]
    fn test_fallback_toc_from_chapters() {
        let chapters = vec![("Loomings".to_string(), "words".to_string())];
        let toc = map_toc(
            &[],
            &[Chapter {
                path: "a.xhtml".to_string(),
                text: format!("{}\n{}", chapters[0].0, chapters[0].1),
            }],
        );
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].title, "Loomings");
    }

    #[test]
    fn test_not_a_zip() {
        let err = EpubDecoder.decode(b"definitely not a zip".to_vec()).err().unwrap();
        assert_eq!(err.kind(), "epub_reader");
    }

    #[test]
    fn test_missing_chapter_reports_chapter() {
        let mut fixture = EpubFixture::sample(2);
        fixture.omit_chapter = Some(2);
        let err = EpubDecoder.decode(build_epub(&fixture)).err().unwrap();
        match err {
            ReaderError::EpubReader { chapter, .. } => assert_eq!(chapter, Some(2)),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_sniff_fixture() {
        let bytes = build_epub(&EpubFixture::sample(1));
        assert!(EpubDecoder.sniff(&bytes[..bytes.len().min(crate::document::SNIFF_LEN)]));
    }
}
