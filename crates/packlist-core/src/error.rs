//! Error types for the packlist-core library.

use thiserror::Error;

/// Main error type for the packlist library.
///
/// Only failures that end a whole conversion surface here. Missing table
/// geometry, unmatched field rules and ragged page tables are absorbed by
/// the extractors and never become errors.
#[derive(Error, Debug)]
pub enum PacklistError {
    /// PDF processing error. The document could not be read at all.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Field rule construction error.
    #[error("rule error: {0}")]
    Rule(#[from] RuleError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// A page content stream could not be decoded.
    #[error("failed to decode page content: {0}")]
    Content(String),
}

/// Errors raised while building field rules.
#[derive(Error, Debug)]
pub enum RuleError {
    /// The rule's pattern is not a valid regular expression.
    #[error("invalid pattern for rule {name:?}: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// The capture group does not exist in the pattern.
    #[error("rule {name:?} captures group {group} but the pattern has only {available}")]
    InvalidCaptureGroup {
        name: String,
        group: usize,
        available: usize,
    },

    /// Two rules in one set share a name.
    #[error("duplicate rule name: {0}")]
    DuplicateName(String),

    /// No built-in rule set has this name.
    #[error("unknown rule set: {0}")]
    UnknownRuleSet(String),
}

/// Result type for the packlist library.
pub type Result<T> = std::result::Result<T, PacklistError>;
