//! OPF (Open Packaging Format) parsing
//!
//! Reads `META-INF/container.xml` to locate the package document, then
//! extracts metadata, manifest, and spine from it.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::document::{BookMetadata, Creator};
use crate::error::{ReaderError, ReaderResult};

/// Manifest item with its href resolved to a full archive path
#[derive(Debug, Clone)]
pub struct ManifestItem {
    pub id: String,
    pub path: String,
    pub media_type: String,
    pub properties: Option<String>,
}

/// Spine entry in reading order
#[derive(Debug, Clone)]
pub struct SpineItem {
    pub idref: String,
    pub path: String,
    pub linear: bool,
}

/// Parsed package document
#[derive(Debug, Clone)]
pub struct Package {
    pub metadata: BookMetadata,
    pub manifest: HashMap<String, ManifestItem>,
    pub spine: Vec<SpineItem>,
    /// Manifest id of the EPUB 2 NCX, from `<spine toc="...">`
    pub ncx_id: Option<String>,
}

impl Package {
    /// EPUB 3 navigation document, if declared
    pub fn nav_item(&self) -> Option<&ManifestItem> {
        self.manifest.values().find(|item| {
            item.properties
                .as_deref()
                .is_some_and(|p| p.split_whitespace().any(|prop| prop == "nav"))
        })
    }

    /// EPUB 2 NCX document, if declared
    pub fn ncx_item(&self) -> Option<&ManifestItem> {
        if let Some(item) = self.ncx_id.as_ref().and_then(|id| self.manifest.get(id)) {
            return Some(item);
        }
        self.manifest
            .values()
            .find(|item| item.media_type == "application/x-dtbncx+xml")
    }

    /// Spine items that make up the reading order
    ///
    /// `linear="no"` items are skipped unless nothing else remains.
    pub fn reading_order(&self) -> Vec<&SpineItem> {
        let linear: Vec<&SpineItem> = self.spine.iter().filter(|s| s.linear).collect();
        if linear.is_empty() {
            self.spine.iter().collect()
        } else {
            linear
        }
    }
}

/// Get the value of an attribute by local name
pub(super) fn attribute(element: &BytesStart, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn xml_error(document: &str, position: usize, err: quick_xml::Error) -> ReaderError {
    ReaderError::epub(
        None,
        format!("malformed {} at byte {}: {}", document, position, err),
    )
}

/// Find the package document path in container.xml
pub fn parse_container(xml: &str) -> ReaderResult<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"rootfile" =>
            {
                if let Some(path) = attribute(&e, b"full-path") {
                    return Ok(path);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(xml_error("container.xml", reader.buffer_position(), e)),
        }
    }

    Err(ReaderError::epub(None, "container.xml declares no rootfile"))
}

/// Parse a package document located at `opf_path` inside the archive
pub fn parse_opf(xml: &str, opf_path: &str) -> ReaderResult<Package> {
    let opf_dir = parent_dir(opf_path);
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut metadata = BookMetadata::default();
    let mut manifest = HashMap::new();
    let mut spine_refs: Vec<(String, bool)> = Vec::new();
    let mut ncx_id = None;

    let mut in_metadata = false;
    // Metadata element being read: (local name, role, text)
    let mut current: Option<(Vec<u8>, Option<String>, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"metadata" => in_metadata = true,
                b"item" | b"itemref" => {
                    record_entry(&e, opf_dir, &mut manifest, &mut spine_refs);
                }
                b"spine" => ncx_id = attribute(&e, b"toc"),
                name if in_metadata => {
                    current = Some((name.to_vec(), attribute(&e, b"role"), String::new()));
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                record_entry(&e, opf_dir, &mut manifest, &mut spine_refs);
            }
            Ok(Event::Text(t)) => {
                if let Some((_, _, text)) = current.as_mut() {
                    match t.unescape() {
                        Ok(value) => text.push_str(&value),
                        Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let Some((_, _, text)) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"metadata" => in_metadata = false,
                _ => {
                    if let Some((name, role, text)) = current.take() {
                        apply_metadata(&mut metadata, &name, role, text.trim());
                    }
                }
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(xml_error(opf_path, reader.buffer_position(), e)),
        }
    }

    let mut spine = Vec::with_capacity(spine_refs.len());
    for (idref, linear) in spine_refs {
        match manifest.get(&idref) {
            Some(item) => spine.push(SpineItem {
                idref,
                path: item.path.clone(),
                linear,
            }),
            None => tracing::warn!("Spine references unknown manifest item '{}'", idref),
        }
    }

    Ok(Package {
        metadata,
        manifest,
        spine,
        ncx_id,
    })
}

fn record_entry(
    element: &BytesStart,
    opf_dir: &str,
    manifest: &mut HashMap<String, ManifestItem>,
    spine_refs: &mut Vec<(String, bool)>,
) {
    match element.local_name().as_ref() {
        b"item" => {
            if let (Some(id), Some(href)) =
                (attribute(element, b"id"), attribute(element, b"href"))
            {
                let item = ManifestItem {
                    id: id.clone(),
                    path: resolve_path(opf_dir, &href),
                    media_type: attribute(element, b"media-type").unwrap_or_default(),
                    properties: attribute(element, b"properties"),
                };
                manifest.insert(id, item);
            }
        }
        b"itemref" => {
            if let Some(idref) = attribute(element, b"idref") {
                let linear = attribute(element, b"linear").map_or(true, |l| l != "no");
                spine_refs.push((idref, linear));
            }
        }
        _ => {}
    }
}

fn apply_metadata(metadata: &mut BookMetadata, name: &[u8], role: Option<String>, value: &str) {
    if value.is_empty() {
        return;
    }
    let value = value.to_string();
    match name {
        b"title" if metadata.title.is_none() => metadata.title = Some(value),
        b"creator" => metadata.creators.push(Creator { name: value, role }),
        b"publisher" => metadata.publisher = Some(value),
        b"language" => metadata.language = Some(value),
        b"identifier" if metadata.identifier.is_none() => metadata.identifier = Some(value),
        b"description" => metadata.description = Some(value),
        b"date" if metadata.date.is_none() => metadata.date = Some(value),
        b"rights" => metadata.rights = Some(value),
        b"subject" => metadata.subjects.push(value),
        _ => {}
    }
}

/// Directory part of an archive path ("" for top-level files)
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve an href against the directory of the referencing document
///
/// - Strips URL fragments
/// - URL-decodes percent-encoded characters
/// - Collapses `.` and `..` segments
pub fn resolve_path(base_dir: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let decoded = urlencoding::decode(href)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| href.to_string())
        .replace('\\', "/");

    let joined = if let Some(absolute) = decoded.strip_prefix('/') {
        absolute.to_string()
    } else if base_dir.is_empty() {
        decoded
    } else {
        format!("{}/{}", base_dir, decoded)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
