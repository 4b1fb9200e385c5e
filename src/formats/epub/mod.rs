//! EPUB format support
//!
//! An EPUB is a ZIP container: `META-INF/container.xml` points at the OPF
//! package document, whose spine defines the chapters. The TOC comes from
//! the EPUB 3 navigation document or the EPUB 2 NCX.

mod decoder;
mod navigation;
mod package;
mod xhtml;

pub use decoder::{EpubDecoder, EpubDocument};
pub use navigation::NavPoint;
pub use package::{ManifestItem, Package, SpineItem};

use crate::service::FormatReaderService;

/// Reader service for EPUB documents
pub type EpubReaderService = FormatReaderService<EpubDecoder>;
