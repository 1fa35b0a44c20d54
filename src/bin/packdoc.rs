use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "packdoc", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the image sources referenced by a document.
    Sources(SourcesArgs),
    /// Embed every referenced image and write the enriched document.
    Prepare(PrepareArgs),
}

#[derive(Parser, Debug)]
struct SourcesArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Print each source once, in first-seen order.
    #[arg(long)]
    unique: bool,
}

#[derive(Parser, Debug)]
struct PrepareArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path for the enriched document JSON.
    #[arg(long)]
    out: PathBuf,

    /// Directory relative image paths are resolved against (defaults to the input's directory).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Maximum number of images loaded at once.
    #[arg(long, default_value_t = 8)]
    concurrency: usize,

    /// Per-image deadline in milliseconds.
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = packdoc::JPEG_QUALITY_DEFAULT, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Keep images already embedded in the input instead of resolving them again.
    #[arg(long)]
    skip_existing: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Sources(args) => cmd_sources(args),
        Command::Prepare(args) => cmd_prepare(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_sources(args: SourcesArgs) -> anyhow::Result<()> {
    let doc = packdoc::DocumentNode::from_path(&args.in_path)?;
    let mut sources = packdoc::extract_image_sources(&doc);
    if args.unique {
        sources = packdoc::unique_sources(&sources);
    }
    for s in sources {
        println!("{s}");
    }
    Ok(())
}

fn cmd_prepare(args: PrepareArgs) -> anyhow::Result<()> {
    let doc = packdoc::DocumentNode::from_path(&args.in_path)?;
    let root = args.root.clone().unwrap_or_else(|| {
        args.in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf()
    });

    let deadline = Duration::from_millis(args.timeout_ms);
    let fetcher = packdoc::SourceFetcher::new(packdoc::FetchOpts {
        root,
        http_timeout: deadline,
        ..packdoc::FetchOpts::default()
    });
    let opts = packdoc::PipelineOpts {
        resolve: packdoc::ResolveOpts {
            max_in_flight: args.concurrency,
            timeout: deadline,
            jpeg_quality: args.quality,
        },
        skip_existing: args.skip_existing,
    };
    let mut engine = packdoc::JsonFileEngine::new(&args.out);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    let result = runtime.block_on(packdoc::create_document(
        &doc,
        Arc::new(fetcher),
        &opts,
        &mut engine,
    ));
    // Loads that hit their deadline may still be blocked in a read; don't wait for them.
    runtime.shutdown_background();
    let stats = result.with_context(|| format!("prepare '{}'", args.in_path.display()))?;

    eprintln!(
        "resolved {}/{} images, wrote {}",
        stats.succeeded,
        stats.requested,
        args.out.display()
    );
    Ok(())
}
