//! Test fixtures: synthesized EPUB/PDF files, stub decoders, failing stores

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use parking_lot::Mutex;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::document::{
    BookFormat, BookMetadata, DecodedDocument, FormatDecoder, ReadingPosition, TocEntry,
};
use crate::error::{ReaderError, ReaderResult};
use crate::progress::{ProgressStore, StoreError, StoreResult};

const BODY: &str = "It was a bright cold day in April and the clocks were striking thirteen.";

/// Description of a synthesized EPUB
#[derive(Debug, Clone)]
pub struct EpubFixture {
    pub title: String,
    pub author: String,
    /// (heading, body) per chapter
    pub chapters: Vec<(String, String)>,
    /// 1-based chapter listed in the manifest but missing from the archive
    pub omit_chapter: Option<usize>,
}

impl EpubFixture {
    /// `count` chapters of equal length titled "Chapter N"
    pub fn sample(count: usize) -> Self {
        Self {
            title: "Sample Book".to_string(),
            author: "Jane Doe".to_string(),
            chapters: (1..=count)
                .map(|i| (format!("Chapter {}", i), BODY.to_string()))
                .collect(),
            omit_chapter: None,
        }
    }
}

/// EPUB 3 with a navigation document
pub fn build_epub(fixture: &EpubFixture) -> Vec<u8> {
    write_epub(fixture, false)
}

/// EPUB 2 with an NCX and no navigation document
pub fn build_epub_ncx(fixture: &EpubFixture) -> Vec<u8> {
    write_epub(fixture, true)
}

fn write_epub(fixture: &EpubFixture, ncx: bool) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default();

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();

    zip.start_file("META-INF/container.xml", deflated).unwrap();
    zip.write_all(
        br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
    )
    .unwrap();

    let mut manifest = String::new();
    let mut spine = String::new();
    let mut nav_points = String::new();
    let mut nav_items = String::new();
    for (i, (heading, _)) in fixture.chapters.iter().enumerate() {
        let n = i + 1;
        manifest.push_str(&format!(
            "    <item id=\"ch{n}\" href=\"text/ch{n}.xhtml\" media-type=\"application/xhtml+xml\"/>\n"
        ));
        spine.push_str(&format!("    <itemref idref=\"ch{n}\"/>\n"));
        nav_items.push_str(&format!(
            "      <li><a href=\"text/ch{n}.xhtml\">{heading}</a></li>\n"
        ));
        nav_points.push_str(&format!(
            "    <navPoint id=\"p{n}\" playOrder=\"{n}\"><navLabel><text>{heading}</text></navLabel><content src=\"text/ch{n}.xhtml\"/></navPoint>\n"
        ));
    }
    if ncx {
        manifest.push_str(
            "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
        );
    } else {
        manifest.push_str("    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n");
    }

    let opf = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:fixture</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:creator>{author}</dc:creator>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine toc="ncx">
{spine}  </spine>
</package>"#,
        title = fixture.title,
        author = fixture.author,
    );
    zip.start_file("OEBPS/content.opf", deflated).unwrap();
    zip.write_all(opf.as_bytes()).unwrap();

    if ncx {
        let doc = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <navMap>
{nav_points}  </navMap>
</ncx>"#
        );
        zip.start_file("OEBPS/toc.ncx", deflated).unwrap();
        zip.write_all(doc.as_bytes()).unwrap();
    } else {
        let doc = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<body>
  <nav epub:type="toc">
    <ol>
{nav_items}    </ol>
  </nav>
</body>
</html>"#
        );
        zip.start_file("OEBPS/nav.xhtml", deflated).unwrap();
        zip.write_all(doc.as_bytes()).unwrap();
    }

    for (i, (heading, body)) in fixture.chapters.iter().enumerate() {
        if fixture.omit_chapter == Some(i + 1) {
            continue;
        }
        let chapter = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>{heading}</title></head>
<body>
  <h1>{heading}</h1>
  <p>{body}</p>
</body>
</html>"#
        );
        zip.start_file(format!("OEBPS/text/ch{}.xhtml", i + 1), deflated)
            .unwrap();
        zip.write_all(chapter.as_bytes()).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// PDF with one text line per page and an optional Info title
pub fn build_pdf(pages: &[&str], title: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => pages.len() as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Author" => Object::string_literal("John Roe"),
        });
        doc.trailer.set("Info", info_id);
    }

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Write `bytes` to `dir/name`
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// In-memory document with fixed unit texts
pub struct StubDocument {
    units: Vec<String>,
    /// Unit whose text extraction fails (0-based)
    pub fail_unit: Option<usize>,
    drops: Option<Arc<AtomicUsize>>,
    threads: Option<Arc<Mutex<Vec<ThreadId>>>>,
}

impl StubDocument {
    pub fn new(units: &[&str]) -> Self {
        Self {
            units: units.iter().map(|u| u.to_string()).collect(),
            fail_unit: None,
            drops: None,
            threads: None,
        }
    }
}

impl Drop for StubDocument {
    fn drop(&mut self) {
        if let Some(drops) = &self.drops {
            drops.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl DecodedDocument for StubDocument {
    fn unit_count(&self) -> usize {
        self.units.len()
    }

    fn unit_text(&self, index: usize) -> ReaderResult<String> {
        if let Some(threads) = &self.threads {
            threads.lock().push(thread::current().id());
        }
        if self.fail_unit == Some(index) {
            return Err(ReaderError::content_extraction(Some(index + 1), "stub failure"));
        }
        self.units
            .get(index)
            .cloned()
            .ok_or_else(|| ReaderError::content_extraction(Some(index + 1), "no such unit"))
    }

    fn table_of_contents(&self) -> ReaderResult<Vec<TocEntry>> {
        Ok(self
            .units
            .iter()
            .enumerate()
            .map(|(i, _)| TocEntry {
                title: format!("Unit {}", i + 1),
                page: i + 1,
                level: 0,
                href: None,
            })
            .collect())
    }

    fn metadata(&self) -> ReaderResult<BookMetadata> {
        Ok(BookMetadata::default())
    }
}

/// Decoder producing [`StubDocument`]s and counting their drops
pub struct StubDecoder {
    format: BookFormat,
    units: Vec<String>,
    drops: Arc<AtomicUsize>,
    threads: Arc<Mutex<Vec<ThreadId>>>,
    pub fail_unit: Option<usize>,
}

impl StubDecoder {
    pub fn new(format: BookFormat, units: &[&str]) -> Self {
        Self {
            format,
            units: units.iter().map(|u| u.to_string()).collect(),
            drops: Arc::new(AtomicUsize::new(0)),
            threads: Arc::new(Mutex::new(Vec::new())),
            fail_unit: None,
        }
    }

    /// Shared counter of released documents
    pub fn drops(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.drops)
    }

    /// Threads that extracted unit text, in call order
    pub fn text_threads(&self) -> Arc<Mutex<Vec<ThreadId>>> {
        Arc::clone(&self.threads)
    }
}

impl FormatDecoder for StubDecoder {
    fn format(&self) -> BookFormat {
        self.format
    }

    fn decode(&self, bytes: Vec<u8>) -> ReaderResult<Arc<dyn DecodedDocument>> {
        if bytes.starts_with(b"corrupt") {
            return Err(ReaderError::pdf(None, "corrupt header"));
        }
        Ok(Arc::new(StubDocument {
            units: self.units.clone(),
            fail_unit: self.fail_unit,
            drops: Some(Arc::clone(&self.drops)),
            threads: Some(Arc::clone(&self.threads)),
        }))
    }
}

/// Store whose every operation fails
pub struct FailingStore;

#[async_trait]
impl ProgressStore for FailingStore {
    async fn save(&self, _book_id: &str, _position: &ReadingPosition) -> StoreResult<()> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }

    async fn load(&self, _book_id: &str) -> StoreResult<Option<ReadingPosition>> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }

    async fn delete(&self, _book_id: &str) -> StoreResult<bool> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }

    async fn list_book_ids(&self) -> StoreResult<Vec<String>> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }
}
