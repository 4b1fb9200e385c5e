//! PDF format support (lopdf)

mod decoder;

pub use decoder::{PdfDecoder, PdfDocument};

use crate::service::FormatReaderService;

/// Reader service for PDF documents
pub type PdfReaderService = FormatReaderService<PdfDecoder>;
