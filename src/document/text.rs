//! Plain-text helpers shared by all decoders
//!
//! Matching works on characters, not bytes, so offsets stay meaningful for
//! non-ASCII text and case folding never splits a code point.

use super::types::{SearchOptions, SearchResult};

/// Count whitespace-separated words
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of characters in a page/chapter text
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[inline]
fn fold(c: char, case_sensitive: bool) -> char {
    if case_sensitive {
        c
    } else {
        // Single-char lowercase keeps haystack and needle aligned
        c.to_lowercase().next().unwrap_or(c)
    }
}

/// Find non-overlapping occurrences of `query` in one page/chapter
///
/// `max` bounds the number of matches returned (0 = unlimited). An empty
/// query yields no matches.
pub fn find_matches(
    text: &str,
    query: &str,
    page: usize,
    options: &SearchOptions,
    max: usize,
) -> Vec<SearchResult> {
    if query.is_empty() || text.is_empty() {
        return Vec::new();
    }

    let original: Vec<char> = text.chars().collect();
    let haystack: Vec<char> = original
        .iter()
        .map(|&c| fold(c, options.case_sensitive))
        .collect();
    let needle: Vec<char> = query
        .chars()
        .map(|c| fold(c, options.case_sensitive))
        .collect();

    let mut results = Vec::new();
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if haystack[i..i + needle.len()] != needle[..] {
            i += 1;
            continue;
        }

        let end = i + needle.len();
        let snippet_start = i.saturating_sub(options.snippet_radius);
        let snippet_end = (end + options.snippet_radius).min(original.len());
        let snippet: String = original[snippet_start..snippet_end].iter().collect();

        results.push(SearchResult {
            page,
            offset: i,
            text: original[i..end].iter().collect(),
            snippet: snippet.split_whitespace().collect::<Vec<_>>().join(" "),
        });

        if max > 0 && results.len() >= max {
            break;
        }
        i = end;
    }

    results
}
