//! Batch command - convert many packing-list PDFs in one run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use packlist_core::Converter;

use super::convert::{load_config, render, ExtractionArgs, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching input PDFs
    #[arg(required = true)]
    input: String,

    /// Output directory (default: next to each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    #[command(flatten)]
    extraction: ExtractionArgs,

    /// Also write summary.csv
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Converted,
    Empty,
    Failed,
}

impl Status {
    fn as_str(self) -> &'static str {
        match self {
            Status::Converted => "converted",
            Status::Empty => "empty",
            Status::Failed => "error",
        }
    }
}

/// Result of converting a single file.
struct FileResult {
    path: PathBuf,
    status: Status,
    rows: usize,
    output: Option<PathBuf>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.extraction.apply(&mut config);
    let converter = Converter::from_config(&config)?;
    let table_header = config.output.table_header;

    let files = matching_pdfs(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching PDF files found for pattern: {}", args.input);
    }

    println!("{} Found {} files to convert", style("ℹ").blue(), files.len());

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}",
        )?
        .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        pb.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        let file_start = Instant::now();
        let converted = convert_file(&converter, &path, &args, table_header);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        let result = match converted {
            Ok(Some((rows, output))) => FileResult {
                path,
                status: Status::Converted,
                rows,
                output: Some(output),
                error: None,
                processing_time_ms,
            },
            Ok(None) => {
                warn!("Nothing recognized in {}", path.display());
                FileResult {
                    path,
                    status: Status::Empty,
                    rows: 0,
                    output: None,
                    error: None,
                    processing_time_ms,
                }
            }
            Err(e) => {
                let error_msg = format!("{:#}", e);
                if !args.continue_on_error {
                    pb.abandon();
                    error!("Failed to convert {}: {}", path.display(), error_msg);
                    anyhow::bail!("Conversion failed for {}: {}", path.display(), error_msg);
                }
                warn!("Failed to convert {}: {}", path.display(), error_msg);
                FileResult {
                    path,
                    status: Status::Failed,
                    rows: 0,
                    output: None,
                    error: Some(error_msg),
                    processing_time_ms,
                }
            }
        };
        results.push(result);
        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let count = |status| results.iter().filter(|r| r.status == status).count();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} converted, {} empty, {} failed",
        style(count(Status::Converted)).green(),
        style(count(Status::Empty)).yellow(),
        style(count(Status::Failed)).red()
    );

    let failed: Vec<_> = results.iter().filter(|r| r.status == Status::Failed).collect();
    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Expand a glob pattern to PDF files, sorted by path.
fn matching_pdfs(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Convert one file and write its output. `None` when nothing was recognized.
fn convert_file(
    converter: &Converter,
    path: &Path,
    args: &BatchArgs,
    table_header: bool,
) -> anyhow::Result<Option<(usize, PathBuf)>> {
    let data = fs::read(path)?;
    let Some(dataset) = converter.convert_document(&data)?.into_dataset() else {
        return Ok(None);
    };

    let output_path = output_path_for(path, args.output_dir.as_deref(), args.format);
    fs::write(&output_path, render(&dataset, args.format, table_header)?)?;
    debug!("Wrote output to {}", output_path.display());

    Ok(Some((dataset.len(), output_path)))
}

fn output_path_for(input: &Path, output_dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("packing-list");
    let name = format!("{}.{}", stem, format.extension());
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["filename", "status", "rows", "output", "processing_time_ms", "error"])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let output = result
            .output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        wtr.write_record([
            filename,
            result.status.as_str(),
            &result.rows.to_string(),
            &output,
            &result.processing_time_ms.to_string(),
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
