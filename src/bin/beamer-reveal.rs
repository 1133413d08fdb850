use anyhow::Context;
use beamer_reveal::{Converter, Options};
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "beamer-reveal", version, about = "Convert a Beamer deck into a PPTX with click-by-click reveals")]
struct Args {
    /// Beamer source file
    input: PathBuf,

    /// Output file (defaults to the input with a .pptx extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rasterization resolution in dots per inch
    #[arg(long)]
    dpi: Option<u32>,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads for rendering (defaults to the number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Only print warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.quiet {
        Level::WARN
    } else if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if args.input.extension().and_then(|e| e.to_str()) != Some("tex") {
        tracing::warn!(input = %args.input.display(), "input does not have a .tex extension");
    }

    let mut options = match &args.config {
        Some(path) => Options::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Options::default(),
    };
    if let Some(dpi) = args.dpi {
        options = options.with_resolution(dpi);
    }
    if args.jobs.is_some() {
        options = options.with_jobs(args.jobs);
    }

    let converter = Converter::new(options).context("invalid options")?;
    if !converter.backend().is_available() {
        tracing::warn!(
            compiler = %converter.options().compiler,
            "typesetting backend not found on PATH, every block will fail"
        );
    }

    let report = converter
        .convert_file(&args.input, args.output.as_deref())
        .with_context(|| format!("converting {}", args.input.display()))?;
    println!("{}", report);
    Ok(())
}
