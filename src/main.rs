//! # semgraph CLI
//!
//! The `semgraph` binary serves the HTTP API and offers one-shot commands
//! for working with the in-memory graph. Because state is memory-only, the
//! one-shot commands build their graph from the inputs given on the command
//! line and report on it within the same invocation.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `semgraph serve` | Start the JSON HTTP server |
//! | `semgraph analyze "<text>"` | Extract triples from text and print them |
//! | `semgraph search "<query>" --csv <file>` | Load triples from a CSV file and rank its nodes |
//!
//! ## Examples
//!
//! ```bash
//! semgraph serve --config ./semgraph.toml
//!
//! semgraph analyze "Albert Einstein developed the theory of relativity in 1905."
//!
//! semgraph search "Einstein" --csv facts.csv --top-k 5 --config ./semgraph.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use semgraph::config::{load_config, Config};
use semgraph::embedding::create_embedder;
use semgraph::extract::PatternExtractor;
use semgraph::ingest::IngestionPipeline;
use semgraph::metrics::MetricsAggregator;
use semgraph::rank::SemanticRanker;
use semgraph::server::run_server;
use semgraph::store::TripleStore;

/// In-memory knowledge graph with embedding-based semantic node search.
#[derive(Parser)]
#[command(name = "semgraph", version, about)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the JSON HTTP server.
    Serve,
    /// Extract triples from a piece of text and print them.
    Analyze {
        /// The text to analyze.
        text: String,
    },
    /// Load triples from a CSV file and rank its nodes against a query.
    Search {
        /// Free-text query.
        query: String,
        /// CSV file with subject,relation,object rows.
        #[arg(long)]
        csv: PathBuf,
        /// Number of ranked nodes to return.
        #[arg(long)]
        top_k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Serve => run_server(&config).await,
        Commands::Analyze { text } => run_analyze(&text),
        Commands::Search { query, csv, top_k } => {
            run_search(&config, &query, &csv, top_k.unwrap_or(config.search.top_k)).await
        }
    }
}

fn run_analyze(text: &str) -> Result<()> {
    let store = Arc::new(TripleStore::new());
    let metrics = Arc::new(MetricsAggregator::new());
    let pipeline = IngestionPipeline::new(store.clone(), metrics.clone());

    let report = pipeline.ingest_text(text, &PatternExtractor::new())?;

    println!("analyze");
    println!("  candidates: {}", report.triples.len());
    println!("  added: {}", report.added);
    for t in &report.triples {
        println!("  {}", t.sentence());
    }
    println!(
        "  nodes: {}  triples: {}  time: {} ms",
        store.node_count(),
        store.len(),
        metrics.snapshot().last_graph_time_ms
    );
    Ok(())
}

async fn run_search(config: &Config, query: &str, csv: &PathBuf, top_k: usize) -> Result<()> {
    let store = Arc::new(TripleStore::new());
    let metrics = Arc::new(MetricsAggregator::new());
    let pipeline = IngestionPipeline::new(store.clone(), metrics.clone());

    let filename = csv
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| csv.display().to_string());
    let rows = read_rows(csv)?;
    let report = pipeline.ingest_rows(&filename, &rows)?;
    println!(
        "loaded {}: {} new triples ({} total)",
        filename, report.triples_added, report.triples_total
    );

    let embedder = create_embedder(&config.embedding)?;
    let ranker = SemanticRanker::new(
        embedder.into(),
        Duration::from_secs(config.embedding.timeout_secs),
    );
    let ranked = ranker.rank(&store, query, top_k).await?;

    println!("top nodes for {:?}:", query);
    for n in &ranked.top_nodes {
        println!("  {:.3}  {}", n.score, n.name);
    }
    Ok(())
}

/// Read comma-separated rows from a file. Only the first three fields of
/// each row are consumed downstream; quoting is not interpreted.
fn read_rows(path: &PathBuf) -> Result<Vec<Vec<String>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split(',').map(|f| f.to_string()).collect())
        .collect())
}
