//! doctrans CLI - PDF to DOCX conversion with offline translation

use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use doctrans::{
    AvailablePackage, ConvertOptions, Doctrans, Error, InstalledPackage, PackageRegistry,
    PageSelection, ProvisionObserver, WalkObserver, WalkOptions, WalkStage,
};

#[derive(Parser)]
#[command(name = "doctrans")]
#[command(author = "iyulab")]
#[command(version)]
#[command(
    about = "Convert a PDF to DOCX and translate it offline",
    long_about = None
)]
struct Cli {
    /// Source PDF
    #[arg(value_name = "INPUT_PDF")]
    input_pdf: PathBuf,

    /// DOCX produced from the PDF
    #[arg(value_name = "INTERMEDIATE_DOCX")]
    intermediate_docx: PathBuf,

    /// Translated DOCX
    #[arg(value_name = "OUTPUT_DOCX")]
    output_docx: PathBuf,

    /// ISO 639 code of the source language
    #[arg(long, default_value = "en")]
    src: String,

    /// ISO 639 code of the target language
    #[arg(long, default_value = "pt")]
    dest: String,

    /// Page range to convert (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// Directory holding installed translation packages
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Package index URL or local path
    #[arg(long, value_name = "URL")]
    index_url: Option<String>,

    /// Also translate blank paragraphs and cells
    #[arg(long)]
    keep_blank: bool,

    /// Hide progress bars
    #[arg(long)]
    no_progress: bool,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input_pdf.is_file() {
        return Err(Error::InputNotFound(cli.input_pdf.clone()).into());
    }
    if !doctrans::BACKEND_AVAILABLE {
        return Err(Error::BackendUnavailable.into());
    }

    let pages = match &cli.pages {
        Some(p) => PageSelection::parse(p)?,
        None => PageSelection::All,
    };

    let mut registry = match &cli.model_dir {
        Some(dir) => PackageRegistry::at(dir),
        None => PackageRegistry::default_location()?,
    };
    if let Some(url) = &cli.index_url {
        registry = registry.with_index_url(url.as_str());
    }

    let mut walk_options = WalkOptions::new().with_progress(!cli.no_progress);
    if cli.keep_blank {
        walk_options = walk_options.keep_blank();
    }

    let pipeline = Doctrans::new(cli.src.as_str(), cli.dest.as_str(), registry)
        .with_convert_options(ConvertOptions::new().lenient().with_pages(pages))
        .with_walk_options(walk_options);

    let style = if cli.no_progress {
        None
    } else {
        Some(bar_style()?)
    };

    cmd_provision(&pipeline, style.clone())?;
    cmd_convert(&pipeline, &cli.input_pdf, &cli.intermediate_docx)?;
    cmd_translate(&pipeline, &cli.intermediate_docx, &cli.output_docx, style)?;

    println!(
        "\n{} Review {} and export it to PDF.",
        "Done!".green().bold(),
        cli.output_docx.display()
    );
    Ok(())
}

fn cmd_provision(
    pipeline: &Doctrans,
    style: Option<ProgressStyle>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{} {} -> {} model (if needed)...",
        "Installing".cyan().bold(),
        pipeline.from_code(),
        pipeline.to_code()
    );

    let mut observer = ProvisionProgress { style, bar: None };
    let package = pipeline.provision(&mut observer)?;

    println!(
        "  {} model in {}",
        "Installed".green(),
        package.path.display()
    );
    Ok(())
}

fn cmd_convert(
    pipeline: &Doctrans,
    input: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{} PDF to DOCX...", "Converting".cyan().bold());

    let summary = pipeline.convert(input, output)?;

    println!(
        "  {} {} ({} pages, {} paragraphs, {} tables)",
        "Wrote".green(),
        output.display(),
        summary.pages,
        summary.paragraphs,
        summary.tables
    );
    Ok(())
}

fn cmd_translate(
    pipeline: &Doctrans,
    input: &Path,
    output: &Path,
    style: Option<ProgressStyle>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{} offline translator...", "Loading".cyan().bold());
    let translator = pipeline.load_translator()?;

    println!("{} DOCX...", "Translating".cyan().bold());
    let mut observer = WalkProgress { style, bar: None };
    let stats = pipeline.translate(input, output, &translator, &mut observer)?;

    println!(
        "  {} {} ({}/{} paragraphs, {}/{} cells changed)",
        "Wrote".green(),
        output.display(),
        stats.paragraphs_changed,
        stats.paragraphs_visited,
        stats.cells_changed,
        stats.cells_visited
    );
    Ok(())
}

fn bar_style() -> Result<ProgressStyle, indicatif::style::TemplateError> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
        .progress_chars("#>-"))
}

/// Download and install steps, with a byte bar while downloading.
struct ProvisionProgress {
    style: Option<ProgressStyle>,
    bar: Option<ProgressBar>,
}

impl ProvisionObserver for ProvisionProgress {
    fn on_index_updated(&mut self, count: usize) {
        println!("  {} package index ({} packages)", "Updated".green(), count);
    }

    fn on_download_start(&mut self, package: &AvailablePackage) {
        println!("  {} {}...", "Downloading".yellow(), package);
        if let Some(style) = &self.style {
            let bar = ProgressBar::new(0);
            bar.set_style(style.clone());
            bar.set_message("bytes");
            self.bar = Some(bar);
        }
    }

    fn on_download_progress(&mut self, downloaded: u64, total: Option<u64>) {
        if let Some(bar) = &self.bar {
            if let Some(total) = total {
                bar.set_length(total);
            }
            bar.set_position(downloaded);
        }
    }

    fn on_installing(&mut self, archive: &Path) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        println!("  {} {}...", "Installing".yellow(), archive.display());
    }

    fn on_installed(&mut self, package: &InstalledPackage) {
        log::debug!("Installed {:?}", package.metadata);
    }
}

/// One bar per walk stage.
struct WalkProgress {
    style: Option<ProgressStyle>,
    bar: Option<ProgressBar>,
}

impl WalkObserver for WalkProgress {
    fn on_start(&mut self, stage: WalkStage, total: usize) {
        if let Some(style) = &self.style {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(style.clone());
            bar.set_message(format!("Translating {}", stage.label()));
            self.bar = Some(bar);
        }
    }

    fn on_item(&mut self, _stage: WalkStage, _index: usize) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn on_finish(&mut self, _stage: WalkStage) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}
