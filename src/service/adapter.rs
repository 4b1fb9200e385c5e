//! Generic reader service over a format decoder

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use super::session::{Session, UnitStats};
use super::streams::{SessionChannels, StreamHub};
use super::ReaderService;
use crate::config::ReaderConfig;
use crate::document::{
    BookContent, BookFormat, BookMetadata, DecodedDocument, FormatDecoder, ReaderSettings,
    ReadingPosition, SearchResult, TocEntry, SNIFF_LEN,
};
use crate::error::{NavigationDirection, ProgressOperation, ReaderError, Result};
use crate::progress::ProgressStore;

const MIN_FONT_SIZE: f32 = 8.0;
const MAX_FONT_SIZE: f32 = 72.0;
const MAX_LINE_HEIGHT: f32 = 4.0;
const MAX_MARGIN: u32 = 200;

// Loading stages reported on the loading stream
const LOADED_FILE: f64 = 0.1;
const DECODED: f64 = 0.3;
const INDEX_SPAN: f64 = 0.6;

/// Reader service for any [`FormatDecoder`]
///
/// Holds at most one open book. Opening another book releases the current
/// one first.
pub struct FormatReaderService<D: FormatDecoder> {
    decoder: Arc<D>,
    config: ReaderConfig,
    store: Arc<dyn ProgressStore>,
    session: Option<Session>,
}

impl<D: FormatDecoder + Default> FormatReaderService<D> {
    pub fn new(config: ReaderConfig, store: Arc<dyn ProgressStore>) -> Self {
        Self::with_decoder(D::default(), config, store)
    }
}

impl<D: FormatDecoder> FormatReaderService<D> {
    pub fn with_decoder(decoder: D, config: ReaderConfig, store: Arc<dyn ProgressStore>) -> Self {
        Self {
            decoder: Arc::new(decoder),
            config,
            store,
            session: None,
        }
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or_else(ReaderError::no_book_open)
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or_else(ReaderError::no_book_open)
    }

    /// Read, decode, and index a book into a new session
    async fn load(&self, path: &Path) -> Result<Session> {
        let channels = SessionChannels::new();
        let loading = channels.loading.clone();
        loading.emit(0.0);

        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| ReaderError::book_open(path, e))?
            .len();
        if size > self.config.max_file_bytes {
            return Err(ReaderError::memory(size, self.config.max_file_bytes));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ReaderError::book_open(path, e))?;
        let id = hex::encode(Sha256::digest(&bytes));
        loading.emit(LOADED_FILE);

        let decoder = Arc::clone(&self.decoder);
        let document = tokio::task::spawn_blocking(move || decoder.decode(bytes)).await??;
        loading.emit(DECODED);

        let total_pages = document.unit_count();
        if total_pages == 0 {
            return Err(ReaderError::book_open(path, "document contains no pages"));
        }

        let indexed = Arc::clone(&document);
        let progress = loading.clone();
        let units =
            tokio::task::spawn_blocking(move || index_units(indexed.as_ref(), &progress)).await?;

        let toc = document.table_of_contents()?;
        let metadata = document.metadata()?;
        let title = metadata
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "Untitled".to_string());

        let content = BookContent {
            id,
            path: path.to_path_buf(),
            format: self.decoder.format(),
            title,
            total_pages,
            word_count: units.iter().map(|u| u.words).sum(),
            toc,
            metadata,
        };

        loading.emit(1.0);
        tracing::info!(
            "Opened {} '{}': {} pages, {} words",
            content.format,
            content.title,
            content.total_pages,
            content.word_count
        );

        Ok(Session::new(
            document,
            content,
            units,
            self.config.default_settings.clone(),
            self.decoder.progress_weighting(),
            self.config.page_cache_size,
            channels,
        ))
    }

    async fn persist(&self, book_id: &str, position: &ReadingPosition) -> Result<()> {
        self.store
            .save(book_id, position)
            .await
            .map_err(|e| ReaderError::progress(ProgressOperation::Save, book_id, e.to_string()))
    }

    async fn autosave(&self) -> Result<()> {
        match &self.session {
            Some(session) if self.config.autosave_on_close => {
                self.persist(session.book_id(), &session.position).await
            }
            _ => Ok(()),
        }
    }

    /// Release the open book even if its position cannot be saved
    async fn release(&mut self, reason: &str) {
        if let Err(e) = self.autosave().await {
            tracing::warn!("Dropping unsaved position ({}): {}", reason, e);
        }
        if let Some(session) = self.session.take() {
            tracing::info!("Closed '{}' ({})", session.content.title, reason);
        }
    }

    fn navigate(&mut self, page: usize, direction: NavigationDirection) -> Result<ReadingPosition> {
        let session = self.session_mut()?;
        session.check_page(page, direction)?;

        let position = ReadingPosition::new(page, session.total_pages());
        tracing::debug!("Navigate {} to page {}/{}", direction, page, position.total_pages);
        Ok(session.move_to(position))
    }
}

fn index_units(document: &dyn DecodedDocument, loading: &StreamHub<f64>) -> Vec<UnitStats> {
    let count = document.unit_count();
    (0..count)
        .map(|index| {
            let stats = match document.unit_text(index) {
                Ok(text) => UnitStats::of(&text),
                Err(e) => {
                    tracing::warn!("Indexing page {} without text: {}", index + 1, e);
                    UnitStats::default()
                }
            };
            loading.emit(DECODED + INDEX_SPAN * (index + 1) as f64 / count as f64);
            stats
        })
        .collect()
}

fn validate_settings(settings: &ReaderSettings) -> Result<()> {
    if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&settings.font_size) {
        return Err(ReaderError::settings(
            "font_size",
            format!(
                "{} is outside {}..={}",
                settings.font_size, MIN_FONT_SIZE, MAX_FONT_SIZE
            ),
        ));
    }
    if !(settings.line_height > 0.0 && settings.line_height <= MAX_LINE_HEIGHT) {
        return Err(ReaderError::settings(
            "line_height",
            format!("{} is outside (0, {}]", settings.line_height, MAX_LINE_HEIGHT),
        ));
    }
    if settings.margin > MAX_MARGIN {
        return Err(ReaderError::settings(
            "margin",
            format!("{} exceeds {}", settings.margin, MAX_MARGIN),
        ));
    }
    Ok(())
}

async fn read_header(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut header).await?;
    Ok(header)
}

#[async_trait]
impl<D: FormatDecoder> ReaderService for FormatReaderService<D> {
    fn format(&self) -> BookFormat {
        self.decoder.format()
    }

    fn is_open(&self) -> bool {
        self.session.is_some()
    }

    async fn open_book(&mut self, path: &Path, format: BookFormat) -> Result<BookContent> {
        if format != self.decoder.format() {
            return Err(ReaderError::unsupported_format(format.extension()));
        }

        if self.session.is_some() {
            self.release("replaced").await;
        }

        let session = self.load(path).await?;
        let content = session.content.clone();
        self.session = Some(session);
        Ok(content)
    }

    async fn close_book(&mut self) -> Result<bool> {
        if self.session.is_none() {
            return Ok(true);
        }

        self.autosave().await?;
        if let Some(session) = self.session.take() {
            tracing::info!("Closed '{}'", session.content.title);
        }
        Ok(true)
    }

    fn force_close(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::warn!("Released '{}' without saving its position", session.content.title);
        }
    }

    fn current_position(&self) -> Result<ReadingPosition> {
        Ok(self.session()?.position)
    }

    fn update_position(&mut self, position: ReadingPosition) -> Result<ReadingPosition> {
        let session = self.session_mut()?;
        let position = session.normalize(position)?;
        tracing::debug!("Position set to page {} offset {}", position.page, position.offset);
        Ok(session.move_to(position))
    }

    fn settings(&self) -> Result<ReaderSettings> {
        Ok(self.session()?.settings.clone())
    }

    fn update_settings(&mut self, settings: ReaderSettings) -> Result<()> {
        let session = self.session_mut()?;
        validate_settings(&settings)?;
        session.settings = settings.clone();
        session.channels.settings.emit(settings);
        Ok(())
    }

    fn go_to_page(&mut self, page: usize) -> Result<ReadingPosition> {
        self.navigate(page, NavigationDirection::Jump)
    }

    fn next_page(&mut self) -> Result<ReadingPosition> {
        let page = self.session()?.position.page + 1;
        self.navigate(page, NavigationDirection::Forward)
    }

    fn previous_page(&mut self) -> Result<ReadingPosition> {
        let page = self.session()?.position.page.saturating_sub(1);
        self.navigate(page, NavigationDirection::Backward)
    }

    async fn search_text(&self, query: &str, case_sensitive: bool) -> Result<Vec<SearchResult>> {
        let session = self.session()?;
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let texts = session.texts();
        let options = self.config.search.options(case_sensitive);
        let needle = query.to_string();
        let results =
            tokio::task::spawn_blocking(move || texts.search(&needle, &options)).await??;
        tracing::debug!("Search '{}' found {} matches", query, results.len());
        Ok(results)
    }

    async fn page_text(&self, page: usize) -> Result<String> {
        let session = self.session()?;
        let total = session.total_pages();
        if page == 0 || page > total {
            return Err(ReaderError::content_extraction(
                Some(page),
                format!("page {} is outside 1..={}", page, total),
            ));
        }

        let texts = session.texts();
        let text = tokio::task::spawn_blocking(move || texts.text(page - 1)).await??;
        Ok(text.as_ref().clone())
    }

    async fn table_of_contents(&self) -> Result<Vec<TocEntry>> {
        Ok(self.session()?.content.toc.clone())
    }

    async fn book_metadata(&self) -> Result<BookMetadata> {
        Ok(self.session()?.content.metadata.clone())
    }

    fn calculate_progress(&self, position: &ReadingPosition) -> Result<f64> {
        Ok(self.session()?.progress(position))
    }

    fn estimate_remaining_time(
        &self,
        position: &ReadingPosition,
        words_per_minute: u32,
    ) -> Result<u64> {
        assert!(words_per_minute > 0, "words_per_minute must be positive");
        let words = self.session()?.remaining_words(position);
        Ok((words as f64 / f64::from(words_per_minute)).round() as u64)
    }

    async fn is_format_supported(&self, path: &Path) -> bool {
        match read_header(path).await {
            Ok(header) => self.decoder.sniff(&header),
            Err(e) => {
                tracing::debug!("Cannot probe {}: {}", path.display(), e);
                false
            }
        }
    }

    async fn save_progress(&self, book_id: &str, position: &ReadingPosition) -> Result<()> {
        self.session()?;
        self.persist(book_id, position).await
    }

    async fn load_progress(&self, book_id: &str) -> Result<Option<ReadingPosition>> {
        self.session()?;
        self.store
            .load(book_id)
            .await
            .map_err(|e| ReaderError::progress(ProgressOperation::Load, book_id, e.to_string()))
    }

    fn position_stream(&self) -> BoxStream<'static, ReadingPosition> {
        match &self.session {
            Some(session) => session.channels.position.subscribe(),
            None => stream::empty().boxed(),
        }
    }

    fn settings_stream(&self) -> BoxStream<'static, ReaderSettings> {
        match &self.session {
            Some(session) => session.channels.settings.subscribe(),
            None => stream::empty().boxed(),
        }
    }

    fn loading_progress_stream(&self) -> BoxStream<'static, f64> {
        match &self.session {
            Some(session) => session.channels.loading.subscribe(),
            None => stream::empty().boxed(),
        }
    }

    async fn dispose(&mut self) {
        self.release("disposed").await;
    }
}
