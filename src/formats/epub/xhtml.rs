//! XHTML text extraction
//!
//! Converts a chapter document into plain text: one line per block element,
//! entities decoded, `head`/`script`/`style` content dropped. Parsing is
//! lenient about end tags since real-world EPUB markup is often sloppy.

use quick_xml::events::Event;
use quick_xml::Reader;

const SKIPPED: &[&[u8]] = &[b"head", b"script", b"style", b"svg"];

const BLOCKS: &[&[u8]] = &[
    b"p", b"div", b"section", b"article", b"aside", b"header", b"footer", b"h1", b"h2", b"h3",
    b"h4", b"h5", b"h6", b"li", b"tr", b"blockquote", b"pre", b"dt", b"dd", b"figcaption",
    b"table", b"ol", b"ul", b"hr", b"br",
];

/// Extract readable text from an XHTML document
///
/// Errors are reported as a plain message; callers attach chapter context.
pub fn extract_text(xhtml: &str) -> std::result::Result<String, String> {
    let mut reader = Reader::from_str(xhtml);
    reader.check_end_names(false);

    let mut raw = String::new();
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if SKIPPED.contains(&name.as_ref()) {
                    skip_depth += 1;
                } else if skip_depth == 0 && BLOCKS.contains(&name.as_ref()) {
                    raw.push('\n');
                }
            }
            Ok(Event::Empty(e)) => {
                if skip_depth == 0 && BLOCKS.contains(&e.local_name().as_ref()) {
                    raw.push('\n');
                }
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                if SKIPPED.contains(&name.as_ref()) {
                    skip_depth = skip_depth.saturating_sub(1);
                } else if skip_depth == 0 && BLOCKS.contains(&name.as_ref()) {
                    raw.push('\n');
                }
            }
            Ok(Event::Text(t)) if skip_depth == 0 => {
                let text = String::from_utf8_lossy(&t);
                raw.push_str(&html_escape::decode_html_entities(&text));
            }
            Ok(Event::CData(t)) if skip_depth == 0 => {
                raw.push_str(&String::from_utf8_lossy(&t));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "malformed markup at byte {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
        }
    }

    Ok(normalize_lines(&raw))
}

/// Collapse whitespace within lines and drop empty lines
fn normalize_lines(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First line of a chapter, used as a fallback TOC title
pub fn first_line(text: &str, max_chars: usize) -> Option<String> {
    let line = text.lines().next()?.trim();
    if line.is_empty() {
        return None;
    }
    Some(line.chars().take(max_chars).collect())
}
