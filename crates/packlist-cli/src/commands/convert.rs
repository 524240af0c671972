//! Convert command - turn a single packing-list PDF into a spreadsheet.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_xlsxwriter::Workbook;
use tracing::{debug, info};

use packlist_core::models::PacklistConfig;
use packlist_core::{Converter, Dataset, ModeKind, Strategy};

use super::config::default_config_path;

/// Arguments for the convert command.
#[derive(Args)]
pub struct ConvertArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    #[command(flatten)]
    extraction: ExtractionArgs,

    /// Print the first N rows after converting
    #[arg(long, value_name = "N")]
    preview: Option<usize>,
}

/// Overrides applied on top of the loaded configuration.
#[derive(Args, Clone, Default)]
pub struct ExtractionArgs {
    /// Extraction mode
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Built-in field rule set (fields mode)
    #[arg(long)]
    rule_set: Option<String>,

    /// Column boundary strategy (table mode)
    #[arg(long, value_enum)]
    vertical: Option<StrategyArg>,

    /// Row boundary strategy (table mode)
    #[arg(long, value_enum)]
    horizontal: Option<StrategyArg>,

    /// Distance within which positions snap to one band
    #[arg(long)]
    snap_tolerance: Option<f64>,

    /// Gap within which neighbouring tokens or segments are joined
    #[arg(long)]
    join_tolerance: Option<f64>,

    /// Minimum ruling line length
    #[arg(long)]
    edge_min_length: Option<f64>,

    /// Slack when placing tokens into ruled cells
    #[arg(long)]
    intersection_tolerance: Option<f64>,

    /// Emit a col_N header row for table output
    #[arg(long)]
    header: bool,

    /// Maximum pages to read (0 = all)
    #[arg(long)]
    max_pages: Option<usize>,
}

impl ExtractionArgs {
    /// Apply command-line overrides to a configuration.
    pub fn apply(&self, config: &mut PacklistConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if let Some(rule_set) = &self.rule_set {
            config.mode = ModeKind::Fields;
            config.fields.rule_set = rule_set.clone();
            config.fields.custom_rules.clear();
        }
        if let Some(vertical) = self.vertical {
            config.table.vertical_mode = vertical.into();
        }
        if let Some(horizontal) = self.horizontal {
            config.table.horizontal_mode = horizontal.into();
        }
        if let Some(v) = self.snap_tolerance {
            config.table.snap_tolerance = v;
        }
        if let Some(v) = self.join_tolerance {
            config.table.join_tolerance = v;
        }
        if let Some(v) = self.edge_min_length {
            config.table.edge_min_length = v;
        }
        if let Some(v) = self.intersection_tolerance {
            config.table.intersection_tolerance = v;
        }
        if self.header {
            config.output.table_header = true;
        }
        if let Some(max_pages) = self.max_pages {
            config.pdf.max_pages = max_pages;
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// CSV spreadsheet
    Csv,
    /// JSON output
    Json,
    /// Aligned plain text
    Text,
    /// Excel workbook with a single sheet
    Xlsx,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
            OutputFormat::Xlsx => "xlsx",
        }
    }

    /// Whether the output can be written to a terminal.
    pub fn is_textual(self) -> bool {
        !matches!(self, OutputFormat::Xlsx)
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ModeArg {
    /// Reconstruct a table from text positions or rulings
    Table,
    /// Extract named fields per page
    Fields,
}

impl From<ModeArg> for ModeKind {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Table => ModeKind::Table,
            ModeArg::Fields => ModeKind::Fields,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum StrategyArg {
    /// Cluster token positions
    Text,
    /// Use drawn ruling lines
    Lines,
}

impl From<StrategyArg> for Strategy {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::Text => Strategy::ByTextPosition,
            StrategyArg::Lines => Strategy::ByRulingLines,
        }
    }
}

pub async fn run(args: ConvertArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.extraction.apply(&mut config);
    let converter = Converter::from_config(&config)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if args.output.is_none() && !args.format.is_textual() {
        anyhow::bail!("{} output needs --output", args.format.extension());
    }

    info!("Converting file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Reading {}", args.input.display()));

    let data = fs::read(&args.input)?;
    let outcome = tokio::task::spawn_blocking(move || converter.convert_document(&data)).await?;

    pb.finish_and_clear();

    let Some(dataset) = outcome?.into_dataset() else {
        eprintln!(
            "{} No table or fields recognized in {}",
            style("!").yellow(),
            args.input.display()
        );
        return Ok(());
    };

    let output = render(&dataset, args.format, config.output.table_header)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Wrote {} rows to {}",
            style("✓").green(),
            dataset.len(),
            output_path.display()
        );
    } else {
        io::stdout().write_all(&output)?;
    }

    if let Some(n) = args.preview {
        eprintln!();
        eprintln!("{} Preview (first {} rows):", style("ℹ").blue(), n.min(dataset.len()));
        eprint!("{}", preview(&dataset, n, config.output.table_header));
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Load the configuration from `path`, the default location, or defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<PacklistConfig> {
    if let Some(path) = path {
        return PacklistConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e));
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        Ok(PacklistConfig::from_file(&default_path)?)
    } else {
        Ok(PacklistConfig::default())
    }
}

/// Render a dataset in the requested format.
pub fn render(dataset: &Dataset, format: OutputFormat, table_header: bool) -> anyhow::Result<Vec<u8>> {
    let text = match format {
        OutputFormat::Csv => format_csv(dataset, table_header)?,
        OutputFormat::Json => serde_json::to_string_pretty(dataset)? + "\n",
        OutputFormat::Text => format_text(dataset.header(table_header), dataset.to_string_rows()),
        OutputFormat::Xlsx => return format_xlsx(dataset, table_header),
    };
    Ok(text.into_bytes())
}

/// One worksheet, header row first when the dataset has one.
fn format_xlsx(dataset: &Dataset, table_header: bool) -> anyhow::Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let lines = dataset.header(table_header).into_iter().chain(dataset.to_string_rows());
    for (r, line) in lines.enumerate() {
        let row = u32::try_from(r)?;
        for (c, value) in line.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(row, u16::try_from(c)?, value)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn format_csv(dataset: &Dataset, table_header: bool) -> anyhow::Result<String> {
    // Merged tables may be ragged.
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(vec![]);

    if let Some(header) = dataset.header(table_header) {
        wtr.write_record(&header)?;
    }
    for row in dataset.to_string_rows() {
        wtr.write_record(&row)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(header: Option<Vec<String>>, rows: Vec<Vec<String>>) -> String {
    let lines: Vec<Vec<String>> = header.into_iter().chain(rows).collect();

    let mut widths: Vec<usize> = Vec::new();
    for line in &lines {
        for (i, value) in line.iter().enumerate() {
            let len = value.chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }

    let mut output = String::new();
    for line in &lines {
        let padded: Vec<String> = line
            .iter()
            .enumerate()
            .map(|(i, value)| format!("{:<width$}", value, width = widths[i]))
            .collect();
        output.push_str(padded.join("  ").trim_end());
        output.push('\n');
    }
    output
}

fn preview(dataset: &Dataset, n: usize, table_header: bool) -> String {
    let rows = dataset.to_string_rows().into_iter().take(n).collect();
    format_text(dataset.header(table_header), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use packlist_core::{FieldRecord, Table};

    fn render_text(dataset: &Dataset, format: OutputFormat, table_header: bool) -> String {
        String::from_utf8(render(dataset, format, table_header).unwrap()).unwrap()
    }

    fn rows() -> Dataset {
        Dataset::Rows {
            table: Table::from_rows(vec![
                vec![Some("Carton".to_string()), Some("Qty".to_string())],
                vec![Some("C-1".to_string()), None],
                vec![Some("C-2".to_string())],
            ]),
        }
    }

    #[test]
    fn test_csv_without_header() {
        let csv = render_text(&rows(), OutputFormat::Csv, false);
        assert_eq!(csv, "Carton,Qty\nC-1,\nC-2\n");
    }

    #[test]
    fn test_csv_with_generic_header() {
        let csv = render_text(&rows(), OutputFormat::Csv, true);
        assert!(csv.starts_with("col_1,col_2\n"));
    }

    #[test]
    fn test_records_always_have_header() {
        let mut record = FieldRecord::new(1);
        record.insert("PO #", "7QX41LMB");
        record.insert("ASIN", "B07XJ8C8F5");
        let dataset = Dataset::Records {
            columns: vec!["PO #".to_string(), "ASIN".to_string()],
            records: vec![record],
        };
        let csv = render_text(&dataset, OutputFormat::Csv, false);
        assert_eq!(csv, "PO #,ASIN\n7QX41LMB,B07XJ8C8F5\n");
    }

    #[test]
    fn test_text_is_aligned() {
        let text = render_text(&rows(), OutputFormat::Text, false);
        assert_eq!(text, "Carton  Qty\nC-1\nC-2\n");
    }

    #[test]
    fn test_xlsx_is_a_workbook() {
        let bytes = render(&rows(), OutputFormat::Xlsx, false).unwrap();
        assert!(bytes.starts_with(b"PK"));
        assert!(!OutputFormat::Xlsx.is_textual());
        assert_eq!(OutputFormat::Xlsx.extension(), "xlsx");
    }

    #[test]
    fn test_preview_limits_rows() {
        assert_eq!(preview(&rows(), 1, false), "Carton  Qty\n");
    }

    #[test]
    fn test_rule_set_flag_switches_to_fields() {
        let args = ExtractionArgs {
            rule_set: Some("purchase-order".to_string()),
            snap_tolerance: Some(2.0),
            ..Default::default()
        };
        let mut config = PacklistConfig::default();
        args.apply(&mut config);
        assert_eq!(config.mode, ModeKind::Fields);
        assert_eq!(config.fields.rule_set, "purchase-order");
        assert_eq!(config.table.snap_tolerance, 2.0);
    }
}
