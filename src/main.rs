use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bookocr::config::load_config;
use bookocr::export::{download_links, write_artifacts};
use bookocr::preview::{DEFAULT_PREVIEW_PERCENT, preview_caption, render_preview};
use bookocr::recognition::{OcrsEngine, RecognitionEngine, TesseractCli};
use bookocr::{
    BatchRunner, DebugConfig, Error, PageImage, RecognitionAdapter, SplitLines, TextNormalizer,
    ThresholdMode,
};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum EngineKind {
    Tesseract,
    Ocrs,
}

#[derive(Parser)]
#[command(name = "bookocr")]
#[command(about = "Extract text from photographed book pages")]
struct Cli {
    /// Page images (JPEG or PNG), processed in natural name order
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// TOML run configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for full_text.txt and processed_text.txt
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Gaussian blur kernel size (odd)
    #[arg(long)]
    blur: Option<u32>,

    /// Reference threshold (0-255)
    #[arg(long)]
    threshold: Option<i32>,

    /// Use the threshold as-is instead of Otsu's level
    #[arg(long)]
    manual_threshold: bool,

    /// Upscale factor applied before recognition
    #[arg(long)]
    scale: Option<f32>,

    /// Recognition language code
    #[arg(long)]
    lang: Option<String>,

    #[arg(long, value_enum, default_value = "tesseract")]
    engine: EngineKind,

    /// Path to the tesseract executable
    #[arg(long, value_name = "PATH")]
    tesseract: Option<PathBuf>,

    /// Directory holding the ocrs models (default ~/.cache/ocrs)
    #[arg(long, value_name = "DIR")]
    ocrs_models: Option<PathBuf>,

    /// Pages processed concurrently
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Per-page recognition timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Left split line in pixels (default 250)
    #[arg(long)]
    left: Option<i64>,

    /// Right split line in pixels (default width - 250)
    #[arg(long)]
    right: Option<i64>,

    /// Write a preview of this page (1-based) and exit
    #[arg(long, value_name = "PAGE")]
    preview: Option<usize>,

    /// Where to write the preview image
    #[arg(long, value_name = "FILE", default_value = "preview.png")]
    preview_out: PathBuf,

    /// Print download links embedding both texts
    #[arg(long)]
    links: bool,

    /// Save every preprocessing step per page to this directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn split_lines(args: &Cli, width: u32) -> SplitLines {
    let defaults = SplitLines::for_width(width);
    SplitLines::clamped(
        args.left.unwrap_or(defaults.left as i64),
        args.right.unwrap_or(defaults.right as i64),
        width,
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Default::default(),
    };
    if let Some(blur) = args.blur {
        config.preprocess.blur_kernel_size = blur;
    }
    if let Some(threshold) = args.threshold {
        config.preprocess.otsu_threshold = threshold;
    }
    if args.manual_threshold {
        config.preprocess.threshold_mode = ThresholdMode::Manual;
    }
    if let Some(scale) = args.scale {
        config.preprocess.scale_factor = scale;
    }
    if let Some(lang) = &args.lang {
        config.engine.language = lang.clone();
    }
    if let Some(jobs) = args.jobs {
        config.batch.jobs = Some(jobs);
    }
    if let Some(secs) = args.timeout {
        config.batch.page_timeout_secs = Some(secs);
    }
    config
        .preprocess
        .validate()
        .context("Invalid preprocessing parameters")?;

    let mut pages = Vec::with_capacity(args.images.len());
    for path in &args.images {
        let page = PageImage::open(path)
            .with_context(|| format!("Failed to load page {}", path.display()))?;
        info!(page = %page.name, width = page.width(), height = page.height(), "Loaded page");
        pages.push(page);
    }
    let pages = bookocr::ordering::order(pages);
    let first_width = pages.first().map(|p| p.width()).unwrap_or_default();
    let lines = split_lines(&args, first_width);
    if lines.is_crossed() {
        warn!(left = lines.left, right = lines.right, "Split lines are crossed");
    }

    if let Some(page_number) = args.preview {
        let index = page_number.saturating_sub(1);
        let preview = render_preview(&pages, index, lines, DEFAULT_PREVIEW_PERCENT)?;
        preview
            .save(&args.preview_out)
            .with_context(|| format!("Failed to save preview {}", args.preview_out.display()))?;
        println!("{}: {}", preview_caption(index), args.preview_out.display());
        return Ok(());
    }

    let engine: Arc<dyn RecognitionEngine> = match args.engine {
        EngineKind::Tesseract => {
            let cli = args
                .tesseract
                .clone()
                .map(TesseractCli::new)
                .unwrap_or_default();
            match cli.list_languages() {
                Ok(langs) if !langs.contains(&config.engine.language) => warn!(
                    language = %config.engine.language,
                    "Language data not installed; every page will fail"
                ),
                Err(e) => warn!(error = %e, "Could not query tesseract languages"),
                _ => {}
            }
            Arc::new(cli)
        }
        EngineKind::Ocrs => Arc::new(match &args.ocrs_models {
            Some(dir) => OcrsEngine::new(dir),
            None => OcrsEngine::from_default_cache()?,
        }),
    };

    let debug = args
        .debug_out
        .clone()
        .map(DebugConfig::new)
        .transpose()
        .context("Failed to prepare debug directory")?;

    let runner = BatchRunner::new(
        RecognitionAdapter::new(engine, config.engine.clone()),
        TextNormalizer::new(config.correction_table()?),
    )
    .with_options(config.batch_options())
    .with_debug(debug)
    .with_progress(|p| info!(done = p.done, total = p.total, "Progress {:.0}%", p.fraction() * 100.0));

    let cancel = runner.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current page");
            cancel.cancel();
        }
    });

    let output = match runner.run(pages, &config.preprocess, Some(lines)).await {
        Ok(output) => output,
        Err(Error::Cancelled {
            completed,
            total,
            partial,
        }) => {
            let paths = write_artifacts(&args.out_dir, &partial)?;
            warn!(
                completed,
                total,
                kept = partial.pages.len(),
                raw = %paths.raw.display(),
                "Batch cancelled; wrote the finished pages"
            );
            anyhow::bail!("Batch cancelled after {} of {} pages", completed, total);
        }
        Err(e) => return Err(e.into()),
    };

    for (page, warning) in output.warnings() {
        warn!(page, "No text recovered: {}", warning);
    }
    let paths = write_artifacts(&args.out_dir, &output)?;
    if args.links {
        for link in download_links(&output) {
            println!("{}", link);
        }
    }

    println!("OCR Process Complete!");
    println!("  {}", paths.raw.display());
    println!("  {}", paths.processed.display());
    Ok(())
}
