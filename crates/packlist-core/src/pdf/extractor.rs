//! PDF page extraction using lopdf and pdf-extract.
//!
//! Text and token positions come from pdf-extract, which decodes fonts.
//! Ruling lines come from walking the content stream with lopdf.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace};

use super::content::{number, MediaBox, RulingInterpreter};
use super::glyphs::{read_glyphs, tokens_to_text, PageGlyphs};
use super::{PageSource, Result};
use crate::error::PdfError;
use crate::models::{Edge, Page, PdfConfig, PositionedToken};

/// Vertical distance within which tokens share a rebuilt text line.
const TEXT_LINE_TOLERANCE: f64 = 3.0;

/// Page tree depth at which attribute lookup gives up.
const MAX_TREE_DEPTH: usize = 32;

/// An opened PDF document, yielding [`Page`]s.
pub struct PdfExtractor {
    document: Document,
    pages: BTreeMap<u32, ObjectId>,
    glyphs: BTreeMap<u32, PageGlyphs>,
    config: PdfConfig,
}

impl PdfExtractor {
    /// Open a PDF from bytes with default settings.
    pub fn load(data: &[u8]) -> Result<Self> {
        Self::load_with(data, PdfConfig::default())
    }

    /// Open a PDF from bytes.
    ///
    /// Encrypted documents are tried with an empty user password.
    pub fn load_with(data: &[u8], config: PdfConfig) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let mut decrypted = None;
        if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract reads bytes, so hand it the decrypted document
            let mut buffer = Vec::new();
            document
                .save_to(&mut buffer)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted = Some(buffer);
        }

        let pages = document.get_pages();
        if pages.is_empty() {
            return Err(PdfError::NoPages);
        }

        let glyph_source = decrypted.as_deref().unwrap_or(data);
        let glyphs = read_glyphs(glyph_source);
        if glyphs.len() < pages.len() {
            debug!(
                "pdf-extract read {} of {} pages, the rest use lopdf text",
                glyphs.len(),
                pages.len()
            );
        }
        debug!("Loaded PDF with {} pages", pages.len());

        Ok(Self {
            document,
            pages,
            glyphs,
            config,
        })
    }

    /// Total pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn read_edges(&self, number: u32, page_id: ObjectId) -> Result<Vec<Edge>> {
        let raw = self
            .document
            .get_page_content(page_id)
            .map_err(|e| PdfError::Content(format!("page {}: {}", number, e)))?;
        let content =
            Content::decode(&raw).map_err(|e| PdfError::Content(format!("page {}: {}", number, e)))?;

        let media = self.media_box(page_id);
        trace!("Page {}: {} operations, {:?}", number, content.operations.len(), media);
        Ok(RulingInterpreter::new(media).run(&content.operations))
    }

    /// Pick the page text: pdf-extract's text, then lopdf's own text, then
    /// text rebuilt from token positions.
    fn page_text(&self, number: u32, tokens: &[PositionedToken]) -> String {
        if let Some(glyphs) = self
            .glyphs
            .get(&number)
            .filter(|glyphs| !glyphs.text.trim().is_empty())
        {
            return glyphs.text.clone();
        }

        if let Some(text) = self
            .document
            .extract_text(&[number])
            .ok()
            .filter(|text| !text.trim().is_empty())
        {
            trace!("Page {}: using lopdf text", number);
            return text;
        }

        if self.config.text_from_tokens {
            trace!("Page {}: rebuilding text from tokens", number);
            return tokens_to_text(tokens, TEXT_LINE_TOLERANCE);
        }
        String::new()
    }

    fn media_box(&self, page_id: ObjectId) -> MediaBox {
        self.inherited(page_id, b"MediaBox", 0)
            .and_then(|o| o.as_array().ok())
            .and_then(|items| {
                items
                    .iter()
                    .map(|item| {
                        self.document
                            .dereference(item)
                            .ok()
                            .and_then(|(_, o)| number(o))
                    })
                    .collect::<Option<Vec<f64>>>()
            })
            .and_then(|values| MediaBox::from_values(&values))
            .unwrap_or_default()
    }

    /// Look up a page attribute, following `/Parent` links for inherited
    /// entries such as `/Resources` and `/MediaBox`.
    fn inherited(&self, node_id: ObjectId, key: &[u8], depth: usize) -> Option<&Object> {
        if depth > MAX_TREE_DEPTH {
            return None;
        }
        let Ok(Object::Dictionary(dict)) = self.document.get_object(node_id) else {
            return None;
        };

        if let Ok(value) = dict.get(key) {
            return self.document.dereference(value).ok().map(|(_, object)| object);
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.inherited(*parent_id, key, depth + 1),
            _ => None,
        }
    }
}

impl PageSource for PdfExtractor {
    fn page_numbers(&self) -> Vec<u32> {
        let numbers = self.pages.keys().copied();
        match self.config.max_pages {
            0 => numbers.collect(),
            limit => numbers.take(limit).collect(),
        }
    }

    fn page(&self, number: u32) -> Result<Page> {
        let page_id = *self.pages.get(&number).ok_or(PdfError::InvalidPage(number))?;
        let edges = self.read_edges(number, page_id)?;
        let tokens = self
            .glyphs
            .get(&number)
            .map(|glyphs| glyphs.tokens.clone())
            .unwrap_or_default();
        let text = self.page_text(number, &tokens);

        debug!(
            "Page {}: {} tokens, {} edges, {} chars of text",
            number,
            tokens.len(),
            edges.len(),
            text.len()
        );

        Ok(Page::new(number)
            .with_tokens(tokens)
            .with_edges(edges)
            .with_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail_to_parse() {
        let result = PdfExtractor::load(b"definitely not a pdf");
        assert!(matches!(result, Err(PdfError::Parse(_))));
    }
}
