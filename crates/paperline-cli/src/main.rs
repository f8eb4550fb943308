use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use paperline_core::AppConfig;
use paperline_core::config::ARXIV_EXPORT_API;
use paperline_core::error::ExitCode;
use paperline_ingest::http::RateLimitedClient;
use paperline_ingest::{
    Diagnostics, DispatchMode, FeedSource, FileSource, JsonMetadataParser, MetadataRoutine,
    RecordDispatcher, RestSink, SourceResolutionChain, TextRoutine, collect_pdfs, sources,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "paperline",
    about = "Resolve arXiv paper metadata and store it through the records API",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level filter (error, warn, info, debug, trace).
    #[arg(long, global = true, env = "PAPERLINE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve metadata for every PDF in a directory and dispatch it.
    Metadata {
        /// Directory searched recursively for `<paper id>.pdf` files.
        #[arg(long)]
        input_files_path: PathBuf,

        /// JSON-lines metadata snapshot, consulted before any other source.
        #[arg(long)]
        metadata_file_path: Option<PathBuf>,

        /// Base URL of the records API. Overrides `sink.api_url`.
        #[arg(long)]
        api_url: Option<String>,

        /// Submit the authorship records of a paper in parallel.
        #[arg(long)]
        concurrent_authors: bool,
    },

    /// Extract the text of every PDF in a directory into `.txt` files.
    Text {
        /// Directory searched recursively for `*.pdf` files.
        #[arg(long)]
        input_files_path: PathBuf,

        /// Directory receiving the text files, mirroring the input layout.
        #[arg(long)]
        output_files_path: PathBuf,
    },

    /// Resolve one paper and print its metadata entries as JSON.
    Resolve {
        paper_id: String,

        #[arg(long)]
        metadata_file_path: Option<PathBuf>,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("cannot load config from {}", path.display()))?,
        None => AppConfig::load()?,
    };

    match cli.command {
        Commands::Metadata {
            input_files_path,
            metadata_file_path,
            api_url,
            concurrent_authors,
        } => {
            let Some(api_url) = api_url.or_else(|| config.sink.api_url.clone()) else {
                eprintln!("No records API configured: pass --api-url or set sink.api_url.");
                std::process::exit(ExitCode::InvalidArgs.code());
            };
            if !input_files_path.is_dir() {
                eprintln!("Not a directory: {}", input_files_path.display());
                std::process::exit(ExitCode::InvalidArgs.code());
            }

            let paper_ids = collect_paper_ids(&input_files_path)
                .with_context(|| format!("cannot scan {}", input_files_path.display()))?;
            info!(count = paper_ids.len(), dir = %input_files_path.display(), "papers found");

            let chain = build_chain(&config, metadata_file_path.as_deref())?;
            let mode = if concurrent_authors || config.sink.concurrent_authors {
                DispatchMode::ConcurrentAuthors
            } else {
                DispatchMode::Sequential
            };
            let dispatcher = RecordDispatcher::new(RestSink::from_config(&api_url, &config)?).with_mode(mode);
            let routine = MetadataRoutine::new(chain, dispatcher);

            let mut diagnostics = Diagnostics::new();
            let report = routine.run(&paper_ids, &mut diagnostics).await;

            println!(
                "Dispatched {} revision(s); {} paper(s) without metadata; {} failed.",
                report.dispatched,
                report.missing.len(),
                report.failed.len()
            );
            for (paper_id, reason) in &report.failed {
                eprintln!("  {paper_id}: {reason}");
            }
            if report.has_failures() {
                std::process::exit(ExitCode::DispatchFailed.code());
            }
        }

        Commands::Text {
            input_files_path,
            output_files_path,
        } => {
            if !input_files_path.is_dir() {
                eprintln!("Not a directory: {}", input_files_path.display());
                std::process::exit(ExitCode::InvalidArgs.code());
            }

            let routine = TextRoutine::new(&input_files_path, &output_files_path);
            let report = tokio::task::spawn_blocking(move || routine.run())
                .await
                .context("text extraction task panicked")?
                .with_context(|| format!("cannot scan {}", input_files_path.display()))?;

            println!(
                "Wrote {} text file(s); {} already present; {} failed.",
                report.written.len(),
                report.skipped.len(),
                report.failed.len()
            );
            for (pdf, reason) in &report.failed {
                eprintln!("  {}: {reason}", pdf.display());
            }
            if report.has_failures() {
                std::process::exit(ExitCode::ExtractionFailed.code());
            }
        }

        Commands::Resolve {
            paper_id,
            metadata_file_path,
        } => {
            let chain = build_chain(&config, metadata_file_path.as_deref())?;
            let mut diagnostics = Diagnostics::new();
            let entries = chain.resolve(&paper_id, &mut diagnostics).await;

            println!("{}", serde_json::to_string_pretty(&entries)?);
            for diagnostic in diagnostics.events() {
                eprintln!("[{:?}] {}", diagnostic.level, diagnostic.message);
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Snapshot file first, then the configured sources, then the arXiv API.
fn build_chain(config: &AppConfig, metadata_file: Option<&Path>) -> Result<SourceResolutionChain> {
    let mut chain = SourceResolutionChain::new();

    if let Some(path) = metadata_file {
        let parser = JsonMetadataParser::with_date_format(&config.dates.snapshot_format)?;
        let source = FileSource::open(path, parser)
            .with_context(|| format!("cannot open metadata file {}", path.display()))?;
        chain.add_source(source);
    }

    for url in &config.sources {
        chain.add_boxed(sources::from_url(url, config)?);
    }

    let arxiv_configured = config
        .sources
        .iter()
        .any(|url| url.trim().trim_end_matches('/') == ARXIV_EXPORT_API);
    if !arxiv_configured {
        let client = RateLimitedClient::from_config(&config.http)?;
        chain.add_source(FeedSource::new(ARXIV_EXPORT_API, client));
    }

    Ok(chain)
}

/// Paper ids named by the `*.pdf` files under `dir`, sorted and deduplicated.
fn collect_paper_ids(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut ids: Vec<String> = collect_pdfs(dir)?
        .iter()
        .filter_map(|path| path.file_stem())
        .map(|stem| stem.to_string_lossy().to_string())
        .collect();
    ids.sort();
    ids.dedup();
    Ok(ids)
}
