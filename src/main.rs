//! # inspectpdf CLI
//!
//! Usage:
//!   inspectpdf report.json -o report.pdf
//!   cat report.json | inspectpdf - -o report.pdf --template template.json
//!   inspectpdf --example > report.json

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};

use inspectpdf::{
    ImageSizeProbe, LayoutConfig, LocalImageResolver, NoProbe, RenderError, Report, ReportRenderer,
};

/// Render an inspection report JSON record to PDF.
#[derive(Parser, Debug)]
#[command(name = "inspectpdf")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Report JSON file, or `-` for stdin
    #[arg(required_unless_present = "example")]
    input: Option<PathBuf>,

    /// Where to write the PDF
    #[arg(short = 'o', long, required_unless_present = "example")]
    output: Option<PathBuf>,

    /// Template JSON providing the background pages
    #[arg(long)]
    template: Option<PathBuf>,

    /// Layout config JSON overriding the default offsets and thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to search for relative image paths (repeatable)
    #[arg(long = "image-dir")]
    image_dirs: Vec<PathBuf>,

    /// Directory holding pre-fetched remote images
    #[arg(long = "cache-dir")]
    cache_dir: Option<PathBuf>,

    /// Do not read image dimensions; estimate image heights instead
    #[arg(long = "no-probe", action = ArgAction::SetTrue)]
    no_probe: bool,

    /// Log every layout decision
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Print an example report JSON and exit
    #[arg(long, action = ArgAction::SetTrue)]
    example: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    if args.example {
        print!("{}", EXAMPLE_REPORT);
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), RenderError> {
    let (Some(input), Some(output)) = (args.input.as_deref(), args.output.as_deref()) else {
        return Err(RenderError::Config("an input and -o <OUTPUT> are required".to_string()));
    };

    let json = read_input(input)?;
    let report = Report::from_json(&json)?;

    let config = match &args.config {
        Some(path) => LayoutConfig::from_path(path)?,
        None => LayoutConfig::default(),
    };

    let mut resolver = LocalImageResolver::default();
    if let Some(dir) = &args.cache_dir {
        resolver = resolver.with_cache_dir(dir);
    }
    for dir in &args.image_dirs {
        resolver = resolver.with_search_dir(dir);
    }

    let mut renderer = ReportRenderer::new(config).with_resolver(resolver);
    if let Some(path) = &args.template {
        renderer = renderer.with_template_path(path);
    }
    renderer = if args.no_probe {
        renderer.with_probe(NoProbe)
    } else {
        renderer.with_probe(ImageSizeProbe)
    };

    let outcome = renderer.render_to_file(&report, output)?;
    eprintln!(
        "✓ Written {} pages to {} ({} placed, {} skipped, {} degraded)",
        outcome.page_count,
        output.display(),
        outcome.placed(),
        outcome.skipped(),
        outcome.degraded()
    );
    Ok(())
}

fn read_input(path: &Path) -> Result<String, RenderError> {
    let io_error = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(io_error)?;
        Ok(buf)
    } else {
        fs::read_to_string(path).map_err(io_error)
    }
}

const EXAMPLE_REPORT: &str = include_str!("../demos/report.json");
