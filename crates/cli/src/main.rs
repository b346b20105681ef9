//! Tandem CLI — the main entry point.
//!
//! Commands:
//! - `onboard`   — Write the default config
//! - `ask`       — Run the agent pipeline for one question
//! - `analyze`   — Summarize a document and extract key information
//! - `compare`   — Run both transport strategies once and compare them
//! - `benchmark` — Repeat the comparison and average the latencies
//! - `info`      — Describe the trade-offs of each strategy

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tandem_agent::StrategyKind;

mod commands;

#[derive(Parser)]
#[command(
    name = "tandem",
    about = "Tandem — multi-agent RAG pipeline with transport strategy benchmarking",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Ask a question through the agent pipeline
    Ask {
        question: String,

        /// Maximum number of context snippets to retrieve
        #[arg(short = 'n', long)]
        max_results: Option<usize>,

        /// Transport strategy: direct or envelope
        #[arg(short, long, default_value = "direct")]
        strategy: StrategyKind,

        /// Skip analysis, validation and coordination
        #[arg(long)]
        simple: bool,

        /// Directory of .txt/.md documents to load
        #[arg(short, long)]
        docs: Option<PathBuf>,
    },

    /// Summarize a document and extract its key information
    Analyze {
        /// The document to analyze
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Run the pipeline under both strategies and compare them
    Compare {
        question: String,

        #[arg(short = 'n', long)]
        max_results: Option<usize>,

        #[arg(short, long)]
        docs: Option<PathBuf>,
    },

    /// Repeat the comparison and report average latencies
    Benchmark {
        question: String,

        /// Number of iterations per strategy
        #[arg(short, long)]
        iterations: Option<usize>,

        #[arg(short, long)]
        docs: Option<PathBuf>,
    },

    /// Describe each strategy's trade-offs
    Info,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Ask {
            question,
            max_results,
            strategy,
            simple,
            docs,
        } => commands::ask::run(&question, max_results, strategy, simple, docs).await?,
        Commands::Analyze { file } => commands::analyze::run(&file).await?,
        Commands::Compare {
            question,
            max_results,
            docs,
        } => commands::compare::run(&question, max_results, docs).await?,
        Commands::Benchmark {
            question,
            iterations,
            docs,
        } => commands::benchmark::run(&question, iterations, docs).await?,
        Commands::Info => commands::info::run()?,
    }

    Ok(())
}
