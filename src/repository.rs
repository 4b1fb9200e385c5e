//! Reader repository
//!
//! The single entry point of the engine. Owns one reader service per format
//! and routes every call to the service of the open book.
//!
//! # States
//!
//! ```text
//!            open_book (ok)                close_book (ok)
//!   Idle ─────────────────────▶ Open(fmt) ─────────────────▶ Idle
//!     ▲                           │
//!     └───────────────────────────┘
//!        open_book (failed): prior book closed, new one not opened
//! ```
//!
//! Every operation that needs an open book fails with
//! [`ReaderError::no_book_open`] while idle; streams complete immediately.

use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};

use crate::config::ReaderConfig;
use crate::document::{
    self, BookContent, BookFormat, BookMetadata, ReaderSettings, ReadingPosition, SearchResult,
    TocEntry,
};
use crate::error::{ReaderError, Result};
use crate::formats::{EpubReaderService, PdfReaderService};
use crate::progress::{MemoryProgressStore, ProgressStore, SqliteProgressStore};
use crate::service::ReaderService;

const DEFAULT_WORDS_PER_MINUTE: u32 = 250;

/// Facade over the per-format reader services
pub struct ReaderRepository {
    pdf: Box<dyn ReaderService>,
    epub: Box<dyn ReaderService>,
    /// Format of the open book; `None` while idle
    active: Option<BookFormat>,
    words_per_minute: u32,
}

impl ReaderRepository {
    pub fn new(pdf: Box<dyn ReaderService>, epub: Box<dyn ReaderService>) -> Self {
        Self {
            pdf,
            epub,
            active: None,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }

    /// Repository with the built-in PDF and EPUB services sharing one store
    pub fn with_config(config: ReaderConfig, store: Arc<dyn ProgressStore>) -> Self {
        let words_per_minute = config.words_per_minute;
        let pdf = PdfReaderService::new(config.clone(), Arc::clone(&store));
        let epub = EpubReaderService::new(config, store);
        Self {
            words_per_minute,
            ..Self::new(Box::new(pdf), Box::new(epub))
        }
    }

    /// Repository whose progress store is chosen by `progress_database_url`
    pub async fn from_config(config: ReaderConfig) -> Result<Self> {
        let store: Arc<dyn ProgressStore> = match &config.progress_database_url {
            Some(url) => {
                let store = SqliteProgressStore::connect(url)
                    .await
                    .map_err(|e| ReaderError::reader_file("connect progress store", e))?;
                tracing::info!("Using progress database {}", url);
                Arc::new(store)
            }
            None => Arc::new(MemoryProgressStore::new()),
        };
        Ok(Self::with_config(config, store))
    }

    fn service_for(&self, format: BookFormat) -> Option<&dyn ReaderService> {
        match format {
            BookFormat::Pdf => Some(self.pdf.as_ref()),
            BookFormat::Epub => Some(self.epub.as_ref()),
            BookFormat::Txt => None,
        }
    }

    fn service_for_mut(&mut self, format: BookFormat) -> Option<&mut dyn ReaderService> {
        match format {
            BookFormat::Pdf => Some(self.pdf.as_mut()),
            BookFormat::Epub => Some(self.epub.as_mut()),
            BookFormat::Txt => None,
        }
    }

    fn active(&self) -> Result<&dyn ReaderService> {
        self.active
            .and_then(|format| self.service_for(format))
            .ok_or_else(ReaderError::no_book_open)
    }

    fn active_mut(&mut self) -> Result<&mut dyn ReaderService> {
        match self.active {
            Some(format) => self
                .service_for_mut(format)
                .ok_or_else(ReaderError::no_book_open),
            None => Err(ReaderError::no_book_open()),
        }
    }

    /// Format of the open book
    pub fn active_format(&self) -> Option<BookFormat> {
        self.active
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Open a book, closing the current one first
    ///
    /// Without an explicit `format` it is detected from the file name. An
    /// unsupported format fails before anything else happens. A failure to
    /// close the current book is logged, the book is released unsaved, and
    /// the open proceeds; if the new book cannot be opened the repository is
    /// left idle.
    pub async fn open_book(
        &mut self,
        path: impl AsRef<Path>,
        format: Option<BookFormat>,
    ) -> Result<BookContent> {
        let path = path.as_ref();
        let format = match format {
            Some(format) => format,
            None => document::detect_format(path)?,
        };
        if self.service_for(format).is_none() {
            return Err(ReaderError::unsupported_format(format.extension()));
        }

        if let Some(previous) = self.active.take() {
            if let Some(service) = self.service_for_mut(previous) {
                if let Err(e) = service.close_book().await {
                    tracing::warn!(
                        "Failed to close {} book before opening {}: {}",
                        previous,
                        path.display(),
                        e
                    );
                    service.force_close();
                }
            }
        }

        let service = self
            .service_for_mut(format)
            .ok_or_else(|| ReaderError::unsupported_format(format.extension()))?;
        let content = service.open_book(path, format).await?;
        self.active = Some(format);
        Ok(content)
    }

    /// Close the open book; `Ok(true)` when already idle
    ///
    /// The repository stays open if the service fails to close.
    pub async fn close_book(&mut self) -> Result<bool> {
        if self.active.is_none() {
            return Ok(true);
        }
        let closed = self.active_mut()?.close_book().await?;
        self.active = None;
        Ok(closed)
    }

    pub fn current_position(&self) -> Result<ReadingPosition> {
        self.active()?.current_position()
    }

    pub fn update_position(&mut self, position: ReadingPosition) -> Result<ReadingPosition> {
        self.active_mut()?.update_position(position)
    }

    pub fn settings(&self) -> Result<ReaderSettings> {
        self.active()?.settings()
    }

    pub fn update_settings(&mut self, settings: ReaderSettings) -> Result<()> {
        self.active_mut()?.update_settings(settings)
    }

    pub fn go_to_page(&mut self, page: usize) -> Result<ReadingPosition> {
        self.active_mut()?.go_to_page(page)
    }

    pub fn next_page(&mut self) -> Result<ReadingPosition> {
        self.active_mut()?.next_page()
    }

    pub fn previous_page(&mut self) -> Result<ReadingPosition> {
        self.active_mut()?.previous_page()
    }

    pub async fn search_text(&self, query: &str, case_sensitive: bool) -> Result<Vec<SearchResult>> {
        self.active()?.search_text(query, case_sensitive).await
    }

    pub async fn page_text(&self, page: usize) -> Result<String> {
        self.active()?.page_text(page).await
    }

    pub async fn table_of_contents(&self) -> Result<Vec<TocEntry>> {
        self.active()?.table_of_contents().await
    }

    pub async fn book_metadata(&self) -> Result<BookMetadata> {
        self.active()?.book_metadata().await
    }

    pub fn calculate_progress(&self, position: &ReadingPosition) -> Result<f64> {
        self.active()?.calculate_progress(position)
    }

    /// Minutes left at `words_per_minute`, or the configured reading speed
    ///
    /// # Panics
    ///
    /// Panics if the effective reading speed is zero, whether passed as
    /// `Some(0)` or configured.
    pub fn estimate_remaining_time(
        &self,
        position: &ReadingPosition,
        words_per_minute: Option<u32>,
    ) -> Result<u64> {
        let service = self.active()?;
        service.estimate_remaining_time(position, words_per_minute.unwrap_or(self.words_per_minute))
    }

    pub async fn save_progress(&self, book_id: &str, position: &ReadingPosition) -> Result<()> {
        self.active()?.save_progress(book_id, position).await
    }

    pub async fn load_progress(&self, book_id: &str) -> Result<Option<ReadingPosition>> {
        self.active()?.load_progress(book_id).await
    }

    /// Whether either service recognizes the file's header
    ///
    /// PDF is probed first. Never fails and never changes state.
    pub async fn is_format_supported(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if self.pdf.is_format_supported(path).await {
            return true;
        }
        self.epub.is_format_supported(path).await
    }

    /// Classify a path by extension
    pub fn detect_format(&self, path: impl AsRef<Path>) -> Result<BookFormat> {
        document::detect_format(path)
    }

    pub fn position_stream(&self) -> BoxStream<'static, ReadingPosition> {
        match self.active() {
            Ok(service) => service.position_stream(),
            Err(_) => stream::empty().boxed(),
        }
    }

    pub fn settings_stream(&self) -> BoxStream<'static, ReaderSettings> {
        match self.active() {
            Ok(service) => service.settings_stream(),
            Err(_) => stream::empty().boxed(),
        }
    }

    pub fn loading_progress_stream(&self) -> BoxStream<'static, f64> {
        match self.active() {
            Ok(service) => service.loading_progress_stream(),
            Err(_) => stream::empty().boxed(),
        }
    }

    /// Release both services; the repository must not be used afterwards
    pub async fn dispose(&mut self) {
        self.pdf.dispose().await;
        self.epub.dispose().await;
        self.active = None;
        tracing::debug!("Reader repository disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::FormatReaderService;
    use crate::testing::{build_epub, build_pdf, write_file, EpubFixture, FailingStore, StubDecoder};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn repository() -> ReaderRepository {
        ReaderRepository::with_config(
            ReaderConfig::default(),
            Arc::new(MemoryProgressStore::new()),
        )
    }

    struct Fixture {
        _dir: TempDir,
        epub: PathBuf,
        pdf: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let epub = write_file(
            dir.path(),
            "sample.epub",
            &build_epub(&EpubFixture::sample(5)),
        );
        let pdf = write_file(
            dir.path(),
            "paper.pdf",
            &build_pdf(&["One", "Two", "Three", "Four"], Some("Paper")),
        );
        Fixture {
            _dir: dir,
            epub,
            pdf,
        }
    }

    /// Repository over stub services; returns drop counters (pdf, epub)
    fn stub_repository(
        store: Arc<dyn ProgressStore>,
    ) -> (ReaderRepository, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let pdf = StubDecoder::new(BookFormat::Pdf, &["p1", "p2", "p3"]);
        let epub = StubDecoder::new(BookFormat::Epub, &["c1", "c2"]);
        let (pdf_drops, epub_drops) = (pdf.drops(), epub.drops());
        let repository = ReaderRepository::new(
            Box::new(FormatReaderService::with_decoder(
                pdf,
                ReaderConfig::default(),
                Arc::clone(&store),
            )),
            Box::new(FormatReaderService::with_decoder(
                epub,
                ReaderConfig::default(),
                store,
            )),
        );
        (repository, pdf_drops, epub_drops)
    }

    fn stub_files(dir: &TempDir) -> (PathBuf, PathBuf) {
        (
            write_file(dir.path(), "a.pdf", b"%PDF-stub"),
            write_file(dir.path(), "b.epub", b"stub"),
        )
    }

    #[tokio::test]
    async fn test_idle_operations_fail_uniformly() {
        let mut repo = repository();
        let position = ReadingPosition::start(1);

        let results: Vec<(&str, Result<()>)> = vec![
            ("current_position", repo.current_position().map(|_| ())),
            ("settings", repo.settings().map(|_| ())),
            ("calculate_progress", repo.calculate_progress(&position).map(|_| ())),
            (
                "estimate_remaining_time",
                repo.estimate_remaining_time(&position, None).map(|_| ()),
            ),
            ("search_text", repo.search_text("x", false).await.map(|_| ())),
            ("page_text", repo.page_text(1).await.map(|_| ())),
            ("table_of_contents", repo.table_of_contents().await.map(|_| ())),
            ("book_metadata", repo.book_metadata().await.map(|_| ())),
            ("save_progress", repo.save_progress("id", &position).await),
            ("load_progress", repo.load_progress("id").await.map(|_| ())),
            ("update_position", repo.update_position(position).map(|_| ())),
            ("update_settings", repo.update_settings(ReaderSettings::default())),
            ("go_to_page", repo.go_to_page(1).map(|_| ())),
            ("next_page", repo.next_page().map(|_| ())),
            ("previous_page", repo.previous_page().map(|_| ())),
        ];

        for (name, result) in results {
            assert_eq!(
                result.unwrap_err(),
                ReaderError::no_book_open(),
                "operation {}",
                name
            );
        }
    }

    #[tokio::test]
    async fn test_idle_streams_complete_empty() {
        let repo = repository();
        assert!(repo.position_stream().collect::<Vec<_>>().await.is_empty());
        assert!(repo.settings_stream().collect::<Vec<_>>().await.is_empty());
        assert!(repo.loading_progress_stream().collect::<Vec<_>>().await.is_empty());
    }

    #[tokio::test]
    async fn test_close_when_idle_succeeds() {
        let mut repo = repository();
        assert!(repo.close_book().await.unwrap());
        assert!(!repo.is_open());
    }

    #[tokio::test]
    async fn test_sample_epub_scenario() {
        let files = fixture();
        let mut repo = repository();

        let content = repo.open_book(&files.epub, None).await.unwrap();
        assert_eq!(content.total_pages, 5);
        assert_eq!(repo.active_format(), Some(BookFormat::Epub));

        let position = repo.go_to_page(3).unwrap();
        let progress = repo.calculate_progress(&position).unwrap();
        assert!((progress - 0.6).abs() < 1e-9);

        assert!(repo.close_book().await.unwrap());
        match repo.current_position() {
            Err(err @ ReaderError::BookOpen { .. }) => assert!(err.is_no_book_open()),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_navigation_bounds() {
        let files = fixture();
        let mut repo = repository();
        let content = repo.open_book(&files.pdf, None).await.unwrap();
        let total = content.total_pages;

        assert_eq!(repo.go_to_page(0).unwrap_err().kind(), "navigation");
        assert_eq!(repo.go_to_page(total + 1).unwrap_err().kind(), "navigation");
        assert_eq!(repo.go_to_page(total).unwrap().page, total);
        assert_eq!(repo.next_page().unwrap_err().kind(), "navigation");
        assert_eq!(repo.current_position().unwrap().page, total);
    }

    #[tokio::test]
    async fn test_progress_monotonic_to_one() {
        let files = fixture();
        let mut repo = repository();
        repo.open_book(&files.pdf, Some(BookFormat::Pdf)).await.unwrap();

        let mut values = vec![repo.calculate_progress(&repo.current_position().unwrap()).unwrap()];
        while let Ok(position) = repo.next_page() {
            values.push(repo.calculate_progress(&position).unwrap());
        }

        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(values.last(), Some(&1.0));
    }

    #[tokio::test]
    async fn test_empty_search() {
        let files = fixture();
        let mut repo = repository();

        for path in [&files.epub, &files.pdf] {
            repo.open_book(path, None).await.unwrap();
            assert!(repo.search_text("", false).await.unwrap().is_empty());
            assert!(repo.search_text("", true).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_progress_round_trip() {
        let files = fixture();
        let mut repo = repository();
        let content = repo.open_book(&files.epub, None).await.unwrap();

        for page in 1..=content.total_pages {
            let position = ReadingPosition::new(page, content.total_pages).with_offset(page);
            repo.save_progress(&content.id, &position).await.unwrap();
            assert_eq!(repo.load_progress(&content.id).await.unwrap(), Some(position));
        }
    }

    #[tokio::test]
    async fn test_autosaved_position_survives_reopen() {
        let files = fixture();
        let mut repo = repository();
        let content = repo.open_book(&files.pdf, None).await.unwrap();
        repo.go_to_page(3).unwrap();
        repo.close_book().await.unwrap();

        repo.open_book(&files.pdf, None).await.unwrap();
        let saved = repo.load_progress(&content.id).await.unwrap().unwrap();
        assert_eq!(saved.page, 3);
        assert_eq!(repo.update_position(saved).unwrap().page, 3);
    }

    #[tokio::test]
    async fn test_switching_formats_closes_previous_once() {
        let dir = tempfile::tempdir().unwrap();
        let (pdf_path, epub_path) = stub_files(&dir);
        let (mut repo, pdf_drops, epub_drops) =
            stub_repository(Arc::new(MemoryProgressStore::new()));

        repo.open_book(&pdf_path, None).await.unwrap();
        assert_eq!(pdf_drops.load(Ordering::SeqCst), 0);

        repo.open_book(&epub_path, None).await.unwrap();
        assert_eq!(pdf_drops.load(Ordering::SeqCst), 1);
        assert_eq!(epub_drops.load(Ordering::SeqCst), 0);
        assert_eq!(repo.active_format(), Some(BookFormat::Epub));
        assert_eq!(repo.current_position().unwrap().total_pages, 2);

        repo.close_book().await.unwrap();
        assert_eq!(pdf_drops.load(Ordering::SeqCst), 1);
        assert_eq!(epub_drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reopening_same_format_closes_previous_once() {
        let dir = tempfile::tempdir().unwrap();
        let (pdf_path, _) = stub_files(&dir);
        let (mut repo, pdf_drops, _) = stub_repository(Arc::new(MemoryProgressStore::new()));

        repo.open_book(&pdf_path, None).await.unwrap();
        repo.go_to_page(2).unwrap();
        repo.open_book(&pdf_path, None).await.unwrap();

        assert_eq!(pdf_drops.load(Ordering::SeqCst), 1);
        assert_eq!(repo.current_position().unwrap().page, 1);
    }

    #[tokio::test]
    async fn test_failed_prior_close_does_not_block_open() {
        let dir = tempfile::tempdir().unwrap();
        let (pdf_path, epub_path) = stub_files(&dir);
        let (mut repo, pdf_drops, epub_drops) = stub_repository(Arc::new(FailingStore));

        repo.open_book(&pdf_path, None).await.unwrap();
        assert_eq!(repo.close_book().await.unwrap_err().kind(), "progress");
        assert!(repo.is_open());
        let old_positions = repo.position_stream();

        let content = repo.open_book(&epub_path, None).await.unwrap();
        assert_eq!(content.format, BookFormat::Epub);
        assert_eq!(repo.active_format(), Some(BookFormat::Epub));

        // The unsaved PDF is released exactly once and its streams end
        assert_eq!(pdf_drops.load(Ordering::SeqCst), 1);
        assert_eq!(epub_drops.load(Ordering::SeqCst), 0);
        assert!(old_positions.collect::<Vec<_>>().await.is_empty());
        assert!(!repo.pdf.is_open());

        repo.dispose().await;
        assert_eq!(pdf_drops.load(Ordering::SeqCst), 1);
        assert_eq!(epub_drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_prior_close_same_format_releases_once() {
        let dir = tempfile::tempdir().unwrap();
        let (pdf_path, _) = stub_files(&dir);
        let (mut repo, pdf_drops, _) = stub_repository(Arc::new(FailingStore));

        repo.open_book(&pdf_path, None).await.unwrap();
        repo.open_book(&pdf_path, None).await.unwrap();

        assert_eq!(pdf_drops.load(Ordering::SeqCst), 1);
        assert_eq!(repo.active_format(), Some(BookFormat::Pdf));
    }

    #[tokio::test]
    async fn test_failed_open_leaves_repository_idle() {
        let dir = tempfile::tempdir().unwrap();
        let (pdf_path, _) = stub_files(&dir);
        let corrupt = write_file(dir.path(), "corrupt.pdf", b"corrupt");
        let (mut repo, pdf_drops, _) = stub_repository(Arc::new(MemoryProgressStore::new()));

        repo.open_book(&pdf_path, None).await.unwrap();
        let err = repo.open_book(&corrupt, None).await.unwrap_err();
        assert_eq!(err.kind(), "pdf_reader");

        assert!(!repo.is_open());
        assert_eq!(pdf_drops.load(Ordering::SeqCst), 1);
        assert!(repo.current_position().unwrap_err().is_no_book_open());
    }

    #[tokio::test]
    async fn test_missing_file_leaves_repository_idle() {
        let files = fixture();
        let mut repo = repository();
        repo.open_book(&files.epub, None).await.unwrap();

        let err = repo.open_book("/nonexistent/missing.pdf", None).await.unwrap_err();
        assert_eq!(err.kind(), "book_open");
        assert!(!err.is_no_book_open());
        assert!(!repo.is_open());
    }

    #[tokio::test]
    async fn test_unsupported_format_keeps_state() {
        let files = fixture();
        let mut repo = repository();
        repo.open_book(&files.epub, None).await.unwrap();
        repo.go_to_page(2).unwrap();

        match repo.open_book("notes.mobi", None).await {
            Err(ReaderError::UnsupportedFormat { extension, .. }) => assert_eq!(extension, "mobi"),
            other => panic!("unexpected result: {:?}", other),
        }
        match repo.open_book(&files.pdf, Some(BookFormat::Txt)).await {
            Err(ReaderError::UnsupportedFormat { extension, .. }) => assert_eq!(extension, "txt"),
            other => panic!("unexpected result: {:?}", other),
        }

        assert_eq!(repo.active_format(), Some(BookFormat::Epub));
        assert_eq!(repo.current_position().unwrap().page, 2);
    }

    #[tokio::test]
    async fn test_is_format_supported() {
        let files = fixture();
        let dir = tempfile::tempdir().unwrap();
        let notes = write_file(dir.path(), "notes.txt", b"plain text notes");
        let repo = repository();

        assert!(!repo.is_format_supported(&notes).await);
        assert!(!repo.is_format_supported("notes.txt").await);
        assert!(repo.is_format_supported(&files.pdf).await);
        assert!(repo.is_format_supported(&files.epub).await);
        assert!(!repo.is_open());
    }

    #[tokio::test]
    async fn test_detect_format_is_independent_of_state() {
        let files = fixture();
        let mut repo = repository();
        assert_eq!(repo.detect_format("a.PDF").unwrap(), BookFormat::Pdf);

        repo.open_book(&files.epub, None).await.unwrap();
        assert_eq!(repo.detect_format("a.epub").unwrap(), BookFormat::Epub);
        assert_eq!(
            repo.detect_format("a.txt").unwrap_err(),
            ReaderError::unsupported_format("txt")
        );
        assert_eq!(repo.active_format(), Some(BookFormat::Epub));
    }

    #[tokio::test]
    async fn test_streams_follow_active_book() {
        let files = fixture();
        let mut repo = repository();
        repo.open_book(&files.pdf, None).await.unwrap();

        let loading: Vec<f64> = repo.loading_progress_stream().take(1).collect().await;
        assert_eq!(loading, vec![0.0]);

        let positions = repo.position_stream();
        let settings = repo.settings_stream();
        repo.next_page().unwrap();
        repo.next_page().unwrap();
        let dark = ReaderSettings {
            theme: crate::document::ReaderTheme::Dark,
            ..ReaderSettings::default()
        };
        repo.update_settings(dark.clone()).unwrap();

        // A new book gets fresh channels; the old streams complete
        repo.open_book(&files.epub, None).await.unwrap();
        let pages: Vec<usize> = positions.map(|p| p.page).collect().await;
        assert_eq!(pages, vec![2, 3]);
        assert_eq!(settings.collect::<Vec<_>>().await, vec![dark]);
        assert_eq!(repo.settings().unwrap(), ReaderSettings::default());
    }

    #[tokio::test]
    async fn test_remaining_time_uses_configured_speed() {
        let files = fixture();
        let config = ReaderConfig {
            words_per_minute: 1,
            ..ReaderConfig::default()
        };
        let mut repo =
            ReaderRepository::with_config(config, Arc::new(MemoryProgressStore::new()));
        let content = repo.open_book(&files.epub, None).await.unwrap();
        let per_chapter = (content.word_count / content.total_pages) as u64;

        let start = ReadingPosition::start(content.total_pages);
        assert_eq!(repo.estimate_remaining_time(&start, None).unwrap(), 4 * per_chapter);
        assert_eq!(
            repo.estimate_remaining_time(&start, Some(per_chapter as u32)).unwrap(),
            4
        );
    }

    #[tokio::test]
    #[should_panic(expected = "words_per_minute")]
    async fn test_zero_configured_speed_is_not_clamped() {
        let files = fixture();
        let config = ReaderConfig {
            words_per_minute: 0,
            ..ReaderConfig::default()
        };
        let mut repo =
            ReaderRepository::with_config(config, Arc::new(MemoryProgressStore::new()));
        let content = repo.open_book(&files.epub, None).await.unwrap();

        let _ = repo.estimate_remaining_time(&ReadingPosition::start(content.total_pages), None);
    }

    #[tokio::test]
    async fn test_dispose_releases_everything() {
        let dir = tempfile::tempdir().unwrap();
        let (pdf_path, _) = stub_files(&dir);
        let (mut repo, pdf_drops, _) = stub_repository(Arc::new(FailingStore));

        repo.open_book(&pdf_path, None).await.unwrap();
        repo.dispose().await;

        assert!(!repo.is_open());
        assert_eq!(pdf_drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_from_config_with_sqlite_store() {
        let files = fixture();
        let config = ReaderConfig {
            progress_database_url: Some("sqlite::memory:".to_string()),
            ..ReaderConfig::default()
        };
        let mut repo = ReaderRepository::from_config(config).await.unwrap();
        let content = repo.open_book(&files.pdf, None).await.unwrap();

        let position = ReadingPosition::new(2, content.total_pages);
        repo.save_progress(&content.id, &position).await.unwrap();
        assert_eq!(repo.load_progress(&content.id).await.unwrap(), Some(position));
    }
}
