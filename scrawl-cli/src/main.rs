//! Command-line demo for the `scrawl` overlay library.
//!
//! `scrawl apply` reads a PDF plus a JSON annotation file (the library's
//! wire format, keyed by zero-based page index) and writes the exported
//! document; `scrawl preview` rasterizes one page to PNG; `scrawl fonts`
//! lists the embeddable fonts of a directory.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use scrawl::{CanvasItem, FontBook, PageDraft, page_geometry, render_preview};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "scrawl")]
#[command(about = "Draw canvas annotations into PDF pages")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a JSON annotation file to a PDF and write the result
    Apply {
        /// Input PDF file
        #[arg(long)]
        pdf: PathBuf,

        /// JSON annotation file: `{"0": [items...], ...}`
        #[arg(long)]
        items: PathBuf,

        /// Directory holding embeddable .ttf/.otf fonts
        #[arg(long)]
        fonts: Option<PathBuf>,

        /// Render resolution the previews were made at
        #[arg(long, default_value_t = 150.0)]
        dpi: f32,

        /// Zoom percentage the previews were displayed at
        #[arg(long, default_value_t = 100.0)]
        zoom: f32,

        /// Output PDF file
        #[arg(long)]
        out: PathBuf,
    },
    /// Rasterize one page to a PNG preview
    Preview {
        /// Input PDF file
        #[arg(long)]
        pdf: PathBuf,

        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Render resolution
        #[arg(long, default_value_t = 150.0)]
        dpi: f32,

        /// Zoom percentage
        #[arg(long, default_value_t = 100.0)]
        zoom: f32,

        /// Output PNG file
        #[arg(long)]
        out: PathBuf,
    },
    /// List the embeddable fonts of a directory
    Fonts {
        /// Directory holding .ttf/.otf fonts
        #[arg(long, default_value = "fonts")]
        fonts: PathBuf,
    },
}

/// A fatal CLI error.
#[derive(Debug)]
enum CliError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Pdf(String),
    Image(String),
}

impl core::fmt::Display for CliError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid annotation file: {err}"),
            Self::Pdf(err) => write!(f, "{err}"),
            Self::Image(err) => write!(f, "{err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn apply(
    pdf_path: &PathBuf,
    items_path: &PathBuf,
    fonts_dir: Option<&PathBuf>,
    dpi: f32,
    zoom: f32,
    out: &PathBuf,
) -> Result<(), CliError> {
    let pdf_bytes = std::fs::read(pdf_path)?;
    let items_json = std::fs::read_to_string(items_path)?;
    let pages: BTreeMap<usize, Vec<CanvasItem>> = serde_json::from_str(&items_json)?;

    let pdf = hayro_syntax::Pdf::new(Arc::new(pdf_bytes.clone()))
        .map_err(|_| CliError::Pdf(format!("{} is not a readable PDF", pdf_path.display())))?;

    // Annotation coordinates are relative to the previews the user drew on,
    // so each page's geometry is derived from the same dpi/zoom settings.
    let mut drafts = BTreeMap::new();
    for (page_index, items) in pages {
        if items.is_empty() {
            continue;
        }
        match page_geometry(&pdf, page_index, dpi, zoom) {
            Ok(geometry) => {
                drafts.insert(page_index, PageDraft { geometry, items });
            }
            Err(err) => log::warn!("skipping page {page_index}: {err}"),
        }
    }

    let book = fonts_dir.map_or_else(FontBook::empty, |dir| FontBook::scan_dir(dir));

    let outcome =
        scrawl::compose(&pdf_bytes, &drafts, &book).map_err(|err| CliError::Pdf(err.to_string()))?;

    for warning in &outcome.warnings {
        eprintln!("warning: {warning}");
    }

    std::fs::write(out, &outcome.bytes)?;
    println!("wrote {} ({} bytes)", out.display(), outcome.bytes.len());
    Ok(())
}

fn preview(
    pdf_path: &PathBuf,
    page: usize,
    dpi: f32,
    zoom: f32,
    out: &PathBuf,
) -> Result<(), CliError> {
    let pdf_bytes = std::fs::read(pdf_path)?;
    let pdf = hayro_syntax::Pdf::new(Arc::new(pdf_bytes))
        .map_err(|_| CliError::Pdf(format!("{} is not a readable PDF", pdf_path.display())))?;

    let preview =
        render_preview(&pdf, page, dpi, zoom).map_err(|err| CliError::Pdf(err.to_string()))?;

    let image = image::RgbaImage::from_raw(preview.pixel_width, preview.pixel_height, preview.rgba)
        .ok_or_else(|| CliError::Image("pixel buffer did not match its dimensions".to_string()))?;
    image
        .save(out)
        .map_err(|err| CliError::Image(err.to_string()))?;

    println!(
        "wrote {} ({}x{} px of a {}x{} pt page)",
        out.display(),
        preview.pixel_width,
        preview.pixel_height,
        preview.geometry.point_width,
        preview.geometry.point_height,
    );
    Ok(())
}

fn list_fonts(dir: &PathBuf) -> Result<(), CliError> {
    let book = FontBook::scan_dir(dir);
    if book.is_empty() {
        println!("no .ttf/.otf fonts in {}", dir.display());
    } else {
        for name in book.names() {
            println!("{name}");
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    match &args.command {
        Command::Apply {
            pdf,
            items,
            fonts,
            dpi,
            zoom,
            out,
        } => apply(pdf, items, fonts.as_ref(), *dpi, *zoom, out),
        Command::Preview {
            pdf,
            page,
            dpi,
            zoom,
            out,
        } => preview(pdf, *page, *dpi, *zoom, out),
        Command::Fonts { fonts } => list_fonts(fonts),
    }
}

fn main() {
    let args = Args::parse();

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        });
    }

    if let Err(err) = run(args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
