//! Format-specific decoders
//!
//! Each submodule implements [`FormatDecoder`](crate::document::FormatDecoder)
//! for one document format and names the reader service built on it.

pub mod epub;
pub mod pdf;

pub use epub::{EpubDecoder, EpubReaderService};
pub use pdf::{PdfDecoder, PdfReaderService};
