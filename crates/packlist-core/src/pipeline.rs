//! Conversion pipeline: pages in, one ordered dataset out.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::fields::{RecordExtractor, RuleSet};
use crate::layout::TableAssembler;
use crate::models::{Dataset, ModeKind, Outcome, PacklistConfig, Page, PdfConfig, TableSettings};
use crate::normalize::{canonical_columns, DatasetBuilder};
use crate::pdf::{PageSource, PdfExtractor};

/// Which engine turns pages into output.
#[derive(Debug, Clone)]
pub enum ExtractionMode {
    /// Reconstruct one table from token positions or rulings.
    Table(TableSettings),
    /// Apply named field rules to each page's text.
    Fields(RuleSet),
}

impl ExtractionMode {
    /// Table mode with validated settings.
    pub fn table(settings: TableSettings) -> Result<Self> {
        settings.validate()?;
        Ok(ExtractionMode::Table(settings))
    }

    /// Field mode using a built-in rule set.
    pub fn fields(rule_set: &str) -> Result<Self> {
        Ok(ExtractionMode::Fields(RuleSet::builtin(rule_set)?))
    }
}

/// Converts documents or pre-read pages into a [`Dataset`].
#[derive(Debug, Clone)]
pub struct Converter {
    mode: ExtractionMode,
    column_order: Vec<usize>,
    field_order: Vec<String>,
    pdf: PdfConfig,
}

impl Converter {
    /// Create a converter with default output ordering.
    pub fn new(mode: ExtractionMode) -> Self {
        Self {
            mode,
            column_order: Vec::new(),
            field_order: Vec::new(),
            pdf: PdfConfig::default(),
        }
    }

    /// Build a converter from configuration.
    ///
    /// Invalid tolerances and broken rules fail here, before any page is read.
    pub fn from_config(config: &PacklistConfig) -> Result<Self> {
        let mode = match config.mode {
            ModeKind::Table => ExtractionMode::table(config.table.clone())?,
            ModeKind::Fields => ExtractionMode::Fields(RuleSet::from_config(&config.fields)?),
        };
        Ok(Self::new(mode)
            .with_column_order(config.output.column_order.clone())
            .with_field_order(config.fields.field_order.clone())
            .with_pdf_config(config.pdf.clone()))
    }

    /// Set the table column order by index.
    pub fn with_column_order(mut self, order: Vec<usize>) -> Self {
        self.column_order = order;
        self
    }

    /// Set the record column order by field name.
    pub fn with_field_order(mut self, order: Vec<String>) -> Self {
        self.field_order = order;
        self
    }

    /// Set PDF reading options.
    pub fn with_pdf_config(mut self, pdf: PdfConfig) -> Self {
        self.pdf = pdf;
        self
    }

    pub fn mode(&self) -> &ExtractionMode {
        &self.mode
    }

    /// Convert already extracted pages. Pure and infallible.
    pub fn convert_pages(&self, pages: &[Page]) -> Dataset {
        let mut builder = self.builder();
        for page in pages {
            self.push_page(&mut builder, page);
        }
        builder.finish()
    }

    /// Convert every page a source yields.
    ///
    /// A page that fails to read is logged and skipped.
    pub fn convert_source<S: PageSource>(&self, source: &S) -> Outcome {
        let mut builder = self.builder();
        let mut skipped = 0;
        for number in source.page_numbers() {
            match source.page(number) {
                Ok(page) => self.push_page(&mut builder, &page),
                Err(e) => {
                    warn!("Skipping page {}: {}", number, e);
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            debug!("{} pages skipped", skipped);
        }
        Outcome::from_dataset(builder.finish())
    }

    /// Convert a PDF held in memory.
    ///
    /// Fails only when the document itself cannot be opened.
    pub fn convert_document(&self, data: &[u8]) -> Result<Outcome> {
        let start = Instant::now();
        let extractor = PdfExtractor::load_with(data, self.pdf.clone())?;
        let outcome = self.convert_source(&extractor);

        info!(
            "Converted {} pages in {} ms: {}",
            extractor.page_count(),
            start.elapsed().as_millis(),
            match &outcome {
                Outcome::Extracted(dataset) => format!("{} rows", dataset.len()),
                Outcome::NothingExtracted => "nothing extracted".to_string(),
            }
        );
        Ok(outcome)
    }

    fn builder(&self) -> DatasetBuilder {
        match &self.mode {
            ExtractionMode::Table(_) => DatasetBuilder::rows(self.column_order.clone()),
            ExtractionMode::Fields(rules) => {
                DatasetBuilder::records(canonical_columns(&rules.field_names(), &self.field_order))
            }
        }
    }

    fn push_page(&self, builder: &mut DatasetBuilder, page: &Page) {
        match &self.mode {
            ExtractionMode::Table(settings) => {
                let table = TableAssembler::new(settings.clone()).extract(&page.tokens, &page.edges);
                debug!("Page {}: {} table rows", page.number, table.len());
                builder.push_table(page.number, table);
            }
            ExtractionMode::Fields(rules) => {
                if let Some(record) = RecordExtractor::new(rules).extract_page(page) {
                    builder.push_record(record);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Edge, PositionedToken, Strategy};
    use pretty_assertions::assert_eq;

    fn token(text: &str, x0: f64, top: f64) -> PositionedToken {
        PositionedToken::new(text, x0, x0 + text.len() as f64 * 6.0, top, top + 10.0)
    }

    fn grid_page(number: u32, rows: &[[&str; 2]], first_top: f64) -> Page {
        let mut tokens = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let top = first_top + i as f64 * 20.0;
            tokens.push(token(row[0], 50.0, top));
            tokens.push(token(row[1], 200.0, top));
        }
        Page::new(number).with_tokens(tokens)
    }

    #[test]
    fn test_table_mode_merges_pages() {
        let pages = vec![
            grid_page(1, &[["Carton", "Qty"], ["C-1", "4"]], 100.0),
            grid_page(2, &[["C-2", "6"], ["C-3", "1"], ["C-4", "9"]], 80.0),
        ];
        let converter = Converter::new(ExtractionMode::Table(TableSettings::default()));
        let dataset = converter.convert_pages(&pages);

        assert_eq!(dataset.len(), 5);
        assert_eq!(dataset.to_string_rows()[4], vec!["C-4", "9"]);
        assert_eq!(dataset.header(false), None);
    }

    #[test]
    fn test_table_mode_column_order() {
        let pages = vec![grid_page(1, &[["Carton", "Qty"]], 100.0)];
        let converter = Converter::new(ExtractionMode::Table(TableSettings::default()))
            .with_column_order(vec![1, 0]);
        let dataset = converter.convert_pages(&pages);
        assert_eq!(dataset.to_string_rows(), vec![vec!["Qty", "Carton"]]);
    }

    #[test]
    fn test_ruled_mode_without_rulings_is_nothing() {
        let settings = TableSettings::default()
            .with_strategies(Strategy::ByRulingLines, Strategy::ByTextPosition);
        let page = grid_page(1, &[["a", "b"]], 100.0)
            .with_edges(vec![Edge::from_points(40.0, 90.0, 40.0, 130.0)]);
        let dataset = Converter::new(ExtractionMode::Table(settings)).convert_pages(&[page]);
        assert_eq!(Outcome::from_dataset(dataset), Outcome::NothingExtracted);
    }

    #[test]
    fn test_fields_mode_one_record_per_text_page() {
        let pages = vec![
            Page::new(1).with_text("PO#: 111\nITEM DESC: Hat\nASIN#: B000000001"),
            Page::new(2).with_text("   "),
            Page::new(3).with_text("PO#: 333"),
        ];
        let converter = Converter::new(ExtractionMode::fields("carton-label").unwrap())
            .with_field_order(vec!["Carton ID".to_string()]);

        match converter.convert_pages(&pages) {
            Dataset::Records { columns, records } => {
                assert_eq!(columns[0], "Carton ID");
                assert_eq!(records.len(), 2);
                assert_eq!(records[0].get("PO #"), Some("111"));
                assert_eq!(records[0].get("Item Description"), Some("Hat"));
                assert_eq!(records[1].page, 3);
                assert_eq!(records[1].names().next(), Some("Carton ID"));
            }
            other => panic!("unexpected dataset: {other:?}"),
        }
    }

    #[test]
    fn test_from_config_rejects_bad_settings() {
        let mut config = PacklistConfig::default();
        config.table.snap_tolerance = -2.0;
        assert!(Converter::from_config(&config).is_err());

        let mut config = PacklistConfig::default();
        config.mode = ModeKind::Fields;
        config.fields.rule_set = "nope".to_string();
        assert!(Converter::from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_selects_mode() {
        let mut config = PacklistConfig::default();
        let converter = Converter::from_config(&config).unwrap();
        assert!(matches!(converter.mode(), ExtractionMode::Table(_)));

        config.mode = ModeKind::Fields;
        config.fields.rule_set = "purchase-order".to_string();
        let converter = Converter::from_config(&config).unwrap();
        match converter.mode() {
            ExtractionMode::Fields(rules) => assert_eq!(rules.name(), "purchase-order"),
            other => panic!("unexpected mode {other:?}"),
        }
    }

    #[test]
    fn test_identical_input_identical_output() {
        let pages = vec![grid_page(1, &[["x", "y"], ["1", "2"]], 100.0)];
        let converter = Converter::new(ExtractionMode::Table(TableSettings::default()));
        assert_eq!(converter.convert_pages(&pages), converter.convert_pages(&pages));
    }
}
