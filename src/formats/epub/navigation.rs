//! Table of contents parsing
//!
//! Supports the EPUB 3 navigation document (`<nav epub:type="toc">`) and the
//! EPUB 2 NCX (`<navMap>` of nested `<navPoint>`s). Both produce a flat list
//! of [`NavPoint`]s in document order with their nesting level.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::package::{attribute, resolve_path};
use crate::error::{ReaderError, ReaderResult};

/// TOC entry before it is mapped onto a spine chapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    pub title: String,
    /// Full archive path of the target (fragment stripped)
    pub path: String,
    /// Original href as written in the document
    pub href: String,
    pub level: usize,
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse an EPUB 3 navigation document located in `nav_dir`
///
/// Prefers the `toc` nav; falls back to the first nav element otherwise.
pub fn parse_nav(xhtml: &str, nav_dir: &str) -> ReaderResult<Vec<NavPoint>> {
    let mut reader = Reader::from_str(xhtml);
    reader.check_end_names(false);

    // (is_toc, entries) per nav element
    let mut navs: Vec<(bool, Vec<NavPoint>)> = Vec::new();
    let mut in_nav = false;
    let mut list_depth = 0usize;
    // Link being read: (href, text)
    let mut link: Option<(String, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"nav" => {
                    let is_toc = attribute(&e, b"type")
                        .is_some_and(|t| t.split_whitespace().any(|v| v == "toc"));
                    navs.push((is_toc, Vec::new()));
                    in_nav = true;
                    list_depth = 0;
                }
                b"ol" | b"ul" if in_nav => list_depth += 1,
                b"a" if in_nav => {
                    link = attribute(&e, b"href").map(|href| (href, String::new()));
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some((_, text)) = link.as_mut() {
                    let raw = String::from_utf8_lossy(&t);
                    text.push_str(&html_escape::decode_html_entities(&raw));
                    text.push(' ');
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"nav" => in_nav = false,
                b"ol" | b"ul" if in_nav => list_depth = list_depth.saturating_sub(1),
                b"a" => {
                    if let (Some((href, text)), Some((_, entries))) = (link.take(), navs.last_mut())
                    {
                        let title = collapse(&text);
                        if !title.is_empty() {
                            entries.push(NavPoint {
                                title,
                                path: resolve_path(nav_dir, &href),
                                href,
                                level: list_depth.saturating_sub(1),
                            });
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ReaderError::epub(
                    None,
                    format!("malformed navigation document: {}", e),
                ))
            }
        }
    }

    let toc_index = navs.iter().position(|(is_toc, _)| *is_toc).unwrap_or(0);
    Ok(if navs.is_empty() {
        Vec::new()
    } else {
        navs.swap_remove(toc_index).1
    })
}

/// Pending navPoint while parsing an NCX
struct PendingPoint {
    title: Option<String>,
    href: Option<String>,
    level: usize,
    emitted: bool,
}

/// Parse an EPUB 2 NCX document located in `ncx_dir`
pub fn parse_ncx(xml: &str, ncx_dir: &str) -> ReaderResult<Vec<NavPoint>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut entries = Vec::new();
    let mut stack: Vec<PendingPoint> = Vec::new();
    let mut in_label = false;
    let mut in_text = false;

    loop {
        let event = reader.read_event();
        match event {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"navPoint" if matches!(event, Ok(Event::Start(_))) => {
                    stack.push(PendingPoint {
                        title: None,
                        href: None,
                        level: stack.len(),
                        emitted: false,
                    });
                }
                b"navLabel" => in_label = true,
                b"text" if in_label => in_text = true,
                b"content" => {
                    if let Some(point) = stack.last_mut() {
                        point.href = attribute(e, b"src");
                        emit(point, ncx_dir, &mut entries);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref t)) if in_text => {
                if let Some(point) = stack.last_mut() {
                    let text = t.unescape().map(|v| v.into_owned()).unwrap_or_default();
                    point.title = Some(collapse(&text));
                    emit(point, ncx_dir, &mut entries);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"navPoint" => {
                    stack.pop();
                }
                b"navLabel" => in_label = false,
                b"text" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ReaderError::epub(None, format!("malformed NCX: {}", e))),
        }
    }

    Ok(entries)
}

fn emit(point: &mut PendingPoint, ncx_dir: &str, entries: &mut Vec<NavPoint>) {
    if point.emitted {
        return;
    }
    if let (Some(title), Some(href)) = (&point.title, &point.href) {
        if title.is_empty() {
            return;
        }
        entries.push(NavPoint {
            title: title.clone(),
            path: resolve_path(ncx_dir, href),
            href: href.clone(),
            level: point.level,
        });
        point.emitted = true;
    }
}
