//! Core library for packing-list PDF conversion.
//!
//! This crate provides:
//! - PDF page reading (positioned text runs, ruling lines, page text)
//! - Table reconstruction from token positions or ruling lines
//! - Rule-based field extraction from page text
//! - Normalization and ordering of the resulting rows or records

pub mod error;
pub mod fields;
pub mod layout;
pub mod models;
pub mod normalize;
pub mod pdf;
pub mod pipeline;

pub use error::{PacklistError, PdfError, Result, RuleError};
pub use fields::{FieldExtractor, FieldRule, FieldRuleSpec, RecordExtractor, RuleSet};
pub use layout::{merge_tables, ClusterResult, TableAssembler, TokenClusterer};
pub use models::{
    Cell, Dataset, Edge, FieldRecord, ModeKind, Outcome, PacklistConfig, Page, PositionedToken,
    Row, Strategy, Table, TableSettings,
};
pub use normalize::{normalize_text, DatasetBuilder};
pub use pdf::{PageSource, PdfExtractor};
pub use pipeline::{Converter, ExtractionMode};
