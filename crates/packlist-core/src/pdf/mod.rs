//! PDF processing module.

mod content;
mod extractor;
mod glyphs;

pub use content::{MediaBox, RulingInterpreter};
pub use extractor::PdfExtractor;
pub use glyphs::{read_glyphs, tokens_to_text, PageGlyphs};

use crate::error::PdfError;
use crate::models::Page;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// A document that can be read page by page.
pub trait PageSource {
    /// Page numbers to process, ascending (1-indexed).
    fn page_numbers(&self) -> Vec<u32>;

    /// Read one page's tokens, edges and text.
    fn page(&self, number: u32) -> Result<Page>;
}
