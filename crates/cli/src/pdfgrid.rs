//! pdfgrid - Rebuild tables from PDF page dumps
//!
//! Reads one or more JSON page dumps, detects table regions on every page,
//! reconstructs their grids and writes the ordered block stream as JSON or
//! as a plain text rendering.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use pdfgrid_core::{
    Converter, DetectorKind, JsonDocument, PageBlock, PageOutput, TableBlock, TableSettings,
};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Output type for the converted pages.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputType {
    /// Ordered block stream per page (default)
    #[default]
    Json,
    /// Paragraphs and `|` separated table rows
    Text,
}

/// Detect and rebuild tables in PDF page dumps.
#[derive(Parser, Debug)]
#[command(name = "pdfgrid")]
#[command(author, version, about, long_about = None)]
#[command(disable_version_flag = true)]
struct Args {
    /// One or more paths to JSON page dumps
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print version information
    #[arg(short = 'V', long = "version", action = ArgAction::Version)]
    version: (),

    /// Log page summaries
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Type of output to generate
    #[arg(short = 't', long = "output-type", value_enum, default_value = "json")]
    output_type: OutputType,

    /// JSON file with table settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated detector order, e.g. "ruled_lines,layout"
    #[arg(long)]
    detectors: Option<String>,

    /// A comma or space separated list of page numbers to convert (1-indexed)
    #[arg(long = "page-numbers")]
    page_numbers: Option<String>,

    /// Directory to write image fallbacks to (if not given, images are only
    /// referenced by their bbox)
    #[arg(short = 'O', long = "image-dir")]
    image_dir: Option<PathBuf>,

    /// Convert pages in parallel
    #[arg(long, action = ArgAction::SetTrue)]
    parallel: bool,
}

#[derive(Serialize)]
struct FileOutput<'a> {
    file: &'a Path,
    pages: &'a [PageOutput],
}

fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Build settings from `--config` and `--detectors`.
fn build_settings(args: &Args) -> Result<TableSettings> {
    let mut settings = match &args.config {
        Some(path) => TableSettings::from_path(path)
            .with_context(|| format!("cannot load settings from {}", path.display()))?,
        None => TableSettings::default(),
    };
    if let Some(list) = &args.detectors {
        let detectors = parse_detectors(list).map_err(anyhow::Error::msg)?;
        if detectors.is_empty() {
            bail!("--detectors needs at least one detector");
        }
        settings = settings.with_detectors(detectors);
    }
    Ok(settings)
}

fn parse_detectors(list: &str) -> std::result::Result<Vec<DetectorKind>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

/// 1-indexed page numbers to 0-indexed page indices.
fn parse_page_numbers(nums: &str) -> Vec<usize> {
    nums.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .map(|n| n - 1)
        .collect()
}

/// Write every image fallback of `pages` as `<stem>-p<page>-<n>.png`.
fn write_images(dir: &Path, source: &Path, pages: &[PageOutput]) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    let stem = source
        .file_stem()
        .map_or_else(|| "page".into(), |s| s.to_string_lossy());
    for page in pages {
        for (n, image) in page.images().enumerate() {
            let path = dir.join(format!("{stem}-p{}-{}.png", page.index + 1, n + 1));
            fs::write(&path, &image.png)
                .with_context(|| format!("cannot write {}", path.display()))?;
            debug!(path = %path.display(), "image fallback written");
        }
    }
    Ok(())
}

fn write_table<W: Write>(out: &mut W, table: &TableBlock) -> io::Result<()> {
    for row in &table.grid {
        let cells: Vec<String> = row.iter().map(|c| c.replace('\n', " ")).collect();
        writeln!(out, "| {} |", cells.join(" | "))?;
    }
    Ok(())
}

fn write_text<W: Write>(out: &mut W, pages: &[PageOutput]) -> io::Result<()> {
    for page in pages {
        writeln!(out, "--- page {} ---", page.index + 1)?;
        for block in &page.blocks {
            match block {
                PageBlock::Content(content) => {
                    let text = content.text();
                    if !text.trim().is_empty() {
                        writeln!(out, "{text}")?;
                    }
                }
                PageBlock::Table(table) => write_table(out, table)?,
                PageBlock::Image(image) => {
                    let [x0, top, x1, bottom]: [f64; 4] = image.bbox.into();
                    writeln!(out, "[image {x0:.1} {top:.1} {x1:.1} {bottom:.1}]")?;
                }
            }
            writeln!(out)?;
        }
        for diagnostic in &page.diagnostics {
            writeln!(out, "! {diagnostic}")?;
        }
    }
    Ok(())
}

/// Convert a single page dump.
fn process_file<W: Write>(
    path: &Path,
    writer: &mut W,
    args: &Args,
    converter: &Converter,
) -> Result<()> {
    let doc = JsonDocument::from_path(path)?;
    let pages = match args.page_numbers.as_deref().map(parse_page_numbers) {
        Some(indices) if !indices.is_empty() => converter.convert_pages(&doc, &indices),
        _ if args.parallel => converter.convert_document_parallel(&doc),
        _ => converter.convert_document(&doc),
    };
    info!(file = %path.display(), pages = pages.len(), "document converted");

    if let Some(dir) = &args.image_dir {
        write_images(dir, path, &pages)?;
    }
    match args.output_type {
        OutputType::Json => {
            serde_json::to_writer_pretty(&mut *writer, &FileOutput { file: path, pages: &pages })?;
            writeln!(writer)?;
        }
        OutputType::Text => write_text(writer, &pages)?,
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let converter = Converter::new(build_settings(&args)?);

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("failed to create output file {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };

    for path in &args.files {
        process_file(path, &mut output, &args, &converter)
            .with_context(|| format!("error processing {}", path.display()))?;
    }

    output.flush()?;
    Ok(())
}
