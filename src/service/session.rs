//! State of one open book

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use super::streams::SessionChannels;
use crate::document::{
    char_len, count_words, find_matches, BookContent, BookFormat, DecodedDocument,
    ProgressWeighting, ReaderSettings, ReadingPosition, SearchOptions, SearchResult,
};
use crate::error::{NavigationDirection, ReaderError, ReaderResult};

/// Word and character counts of one page/chapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitStats {
    pub words: usize,
    pub chars: usize,
}

impl UnitStats {
    pub fn of(text: &str) -> Self {
        Self {
            words: count_words(text),
            chars: char_len(text),
        }
    }
}

/// Page/chapter texts of an open document, shared with blocking tasks
pub struct UnitTexts {
    document: Arc<dyn DecodedDocument>,
    cache: Option<Mutex<LruCache<usize, Arc<String>>>>,
    /// "page" or "chapter"
    label: &'static str,
}

impl UnitTexts {
    pub fn new(document: Arc<dyn DecodedDocument>, cache_size: usize, label: &'static str) -> Self {
        Self {
            document,
            cache: NonZeroUsize::new(cache_size).map(|size| Mutex::new(LruCache::new(size))),
            label,
        }
    }

    pub fn unit_count(&self) -> usize {
        self.document.unit_count()
    }

    /// Text of a page/chapter by 0-based index, through the LRU cache
    pub fn text(&self, index: usize) -> ReaderResult<Arc<String>> {
        if let Some(cache) = &self.cache {
            if let Some(text) = cache.lock().get(&index) {
                return Ok(Arc::clone(text));
            }
        }

        let text = Arc::new(self.document.unit_text(index)?);
        if let Some(cache) = &self.cache {
            cache.lock().put(index, Arc::clone(&text));
        }
        Ok(text)
    }

    /// Scan every page/chapter for `query` in document order
    ///
    /// Decoder work happens here; call it off the async executor.
    pub fn search(&self, query: &str, options: &SearchOptions) -> ReaderResult<Vec<SearchResult>> {
        let mut results = Vec::new();
        if query.is_empty() {
            return Ok(results);
        }

        for index in 0..self.unit_count() {
            let remaining = match options.limit {
                0 => 0,
                limit if results.len() >= limit => break,
                limit => limit - results.len(),
            };

            let text = self.text(index).map_err(|e| {
                ReaderError::search(query, format!("{} {}", self.label, index + 1), e.message())
            })?;
            results.extend(find_matches(&text, query, index + 1, options, remaining));
        }

        Ok(results)
    }
}

/// An open book: decoder handle, derived indices, position, settings, and
/// the event channels. Everything is released when the session is dropped.
pub struct Session {
    texts: Arc<UnitTexts>,
    pub content: BookContent,
    pub position: ReadingPosition,
    pub settings: ReaderSettings,
    units: Vec<UnitStats>,
    total_words: usize,
    weighting: ProgressWeighting,
    pub channels: SessionChannels,
}

impl Session {
    pub fn new(
        document: Arc<dyn DecodedDocument>,
        content: BookContent,
        units: Vec<UnitStats>,
        settings: ReaderSettings,
        weighting: ProgressWeighting,
        cache_size: usize,
        channels: SessionChannels,
    ) -> Self {
        let total_words = units.iter().map(|u| u.words).sum();
        let texts = UnitTexts::new(document, cache_size, unit_label(content.format));
        Self {
            texts: Arc::new(texts),
            position: content.start_position(),
            content,
            settings,
            units,
            total_words,
            weighting,
            channels,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.units.len()
    }

    pub fn book_id(&self) -> &str {
        &self.content.id
    }

    /// Shared handle on the unit texts for blocking work
    pub fn texts(&self) -> Arc<UnitTexts> {
        Arc::clone(&self.texts)
    }

    /// Check that `page` lies in `[1, total_pages]`
    pub fn check_page(&self, page: usize, direction: NavigationDirection) -> ReaderResult<()> {
        let total = self.total_pages();
        if page == 0 || page > total {
            return Err(ReaderError::navigation(page, total, direction));
        }
        Ok(())
    }

    /// Validate a caller-supplied position and normalize its page count
    pub fn normalize(&self, position: ReadingPosition) -> ReaderResult<ReadingPosition> {
        self.check_page(position.page, NavigationDirection::Jump)?;

        let chars = self.units[position.index()].chars;
        if position.offset > chars {
            return Err(ReaderError::Navigation {
                message: format!(
                    "Offset {} is past the end of {} {} ({} characters)",
                    position.offset,
                    unit_label(self.content.format),
                    position.page,
                    chars
                ),
                requested_page: position.page,
                total_pages: self.total_pages(),
                direction: NavigationDirection::Jump,
            });
        }

        Ok(ReadingPosition::new(position.page, self.total_pages()).with_offset(position.offset))
    }

    /// Set the position and publish it
    pub fn move_to(&mut self, position: ReadingPosition) -> ReadingPosition {
        self.position = position;
        self.channels.position.emit(position);
        position
    }

    /// Fraction of the book read at `position`, in `[0, 1]`
    pub fn progress(&self, position: &ReadingPosition) -> f64 {
        let total = self.total_pages();
        if total == 0 {
            return 0.0;
        }
        let page = position.page.min(total);

        let fraction = match self.weighting {
            ProgressWeighting::WordCount if self.total_words > 0 => {
                let read: usize = self.units[..page].iter().map(|u| u.words).sum();
                read as f64 / self.total_words as f64
            }
            _ => page as f64 / total as f64,
        };

        fraction.clamp(0.0, 1.0)
    }

    /// Words in the pages/chapters after `position`
    pub fn remaining_words(&self, position: &ReadingPosition) -> usize {
        let start = position.page.min(self.total_pages());
        self.units[start..].iter().map(|u| u.words).sum()
    }
}

fn unit_label(format: BookFormat) -> &'static str {
    match format {
        BookFormat::Epub => "chapter",
        _ => "page",
    }
}
