//! Configuration management for the reading engine

use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::document::{LayoutMode, ReaderSettings, ReaderTheme, SearchOptions};

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    /// Settings applied to every newly opened book
    pub default_settings: ReaderSettings,
    pub words_per_minute: u32,
    /// Files above this size are rejected before decoding
    pub max_file_bytes: u64,
    pub search: SearchConfig,
    /// Page/chapter texts kept per open book (0 disables the cache)
    pub page_cache_size: usize,
    /// Save the current position when a book is closed
    pub autosave_on_close: bool,
    /// SQLite URL for progress; the in-memory store is used when unset
    pub progress_database_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Maximum results per query (0 = unlimited)
    pub max_results: usize,
    /// Characters of context on each side of a match
    pub snippet_radius: usize,
}

impl SearchConfig {
    pub fn options(&self, case_sensitive: bool) -> SearchOptions {
        SearchOptions {
            case_sensitive,
            limit: self.max_results,
            snippet_radius: self.snippet_radius,
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            default_settings: ReaderSettings::default(),
            words_per_minute: 250,
            max_file_bytes: 512 * MIB,
            search: SearchConfig {
                max_results: 500,
                snippet_radius: 40,
            },
            page_cache_size: 64,
            autosave_on_close: true,
            progress_database_url: None,
        }
    }
}

impl ReaderConfig {
    /// Load from `READER_*` environment variables
    ///
    /// Missing variables keep their defaults; unparseable ones are logged and
    /// ignored.
    pub fn from_env() -> Self {
        let defaults = ReaderConfig::default();
        let settings = &defaults.default_settings;

        let theme = env::var("READER_THEME")
            .ok()
            .and_then(|v| parse_with("READER_THEME", &v, ReaderTheme::parse))
            .unwrap_or(settings.theme);
        let layout = env::var("READER_LAYOUT")
            .ok()
            .and_then(|v| parse_with("READER_LAYOUT", &v, LayoutMode::parse))
            .unwrap_or(settings.layout);

        ReaderConfig {
            default_settings: ReaderSettings {
                font_size: env_or("READER_FONT_SIZE", settings.font_size),
                theme,
                layout,
                ..settings.clone()
            },
            words_per_minute: match env_or("READER_WORDS_PER_MINUTE", defaults.words_per_minute) {
                0 => {
                    tracing::warn!("READER_WORDS_PER_MINUTE must be positive, using default");
                    defaults.words_per_minute
                }
                wpm => wpm,
            },
            max_file_bytes: env::var("READER_MAX_FILE_MB")
                .ok()
                .and_then(|v| parse_with("READER_MAX_FILE_MB", &v, |s| s.parse::<u64>().ok()))
                .map(|mb| mb.saturating_mul(MIB))
                .unwrap_or(defaults.max_file_bytes),
            search: SearchConfig {
                max_results: env_or("READER_SEARCH_MAX_RESULTS", defaults.search.max_results),
                snippet_radius: env_or(
                    "READER_SEARCH_SNIPPET_CHARS",
                    defaults.search.snippet_radius,
                ),
            },
            page_cache_size: env_or("READER_PAGE_CACHE", defaults.page_cache_size),
            autosave_on_close: env_or("READER_AUTOSAVE", defaults.autosave_on_close),
            progress_database_url: env::var("READER_PROGRESS_DB")
                .ok()
                .filter(|url| !url.trim().is_empty()),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| parse_with(name, &v, |s| s.parse().ok()))
        .unwrap_or(default)
}

fn parse_with<T>(name: &str, value: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let parsed = parse(value.trim());
    if parsed.is_none() {
        tracing::warn!("Ignoring invalid {}={:?}, using default", name, value);
    }
    parsed
}
