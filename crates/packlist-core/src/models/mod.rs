//! Data models shared across the pipeline.

pub mod config;
pub mod dataset;
pub mod page;

pub use config::{FieldsConfig, ModeKind, OutputConfig, PacklistConfig, PdfConfig, Strategy, TableSettings};
pub use dataset::{Cell, Dataset, FieldRecord, Outcome, Row, Table};
pub use page::{Edge, Page, PositionedToken};
