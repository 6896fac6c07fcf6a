//! # rag-context CLI (`ragctx`)
//!
//! Builds the vector store and answers retrieval queries from the shell.
//!
//! ## Usage
//!
//! ```bash
//! ragctx --config ./config/ragctx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragctx ingest` | Scan, chunk, embed and persist the vector store |
//! | `ragctx search "<query>"` | Ranked results for a query |
//! | `ragctx context "<query>"` | The assembled prompt context |
//! | `ragctx intent "<query>"` | The query's intent as JSON |
//! | `ragctx resolve <path>` | Citation URL and title for a source path |
//! | `ragctx serve` | Start the HTTP server |
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`);
//! command output goes to stdout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rag_context::config;
use rag_context::intent::analyze_query;
use rag_context::search::{self, MetadataFilter, SearchOptions};
use rag_context::{ingest, server};

/// Documentation retrieval for a chat assistant.
///
/// All commands except `intent` read a TOML configuration file given by
/// `--config`. See `config/ragctx.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ragctx",
    about = "Ingest documentation into a vector store and retrieve prompt context from it",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ragctx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the vector store from the configured source trees.
    ///
    /// Replaces the store atomically; a failed run leaves the previous
    /// store in place.
    Ingest {
        /// Report file and chunk counts without embedding or writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Rank stored chunks against a query.
    ///
    /// Without any filter flag the query's intent drives the filter, with
    /// one relaxation when nothing matches.
    Search {
        query: String,

        #[command(flatten)]
        limits: LimitArgs,

        /// Only chunks of this content type (example, quickstart, guide, spec, ...).
        #[arg(long = "type")]
        content_type: Option<String>,

        /// Only chunks for this role.
        #[arg(long)]
        role: Option<String>,

        /// Only chunks in this language.
        #[arg(long)]
        language: Option<String>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the citation-annotated context for a query.
    Context {
        query: String,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Print the intent classification of a query as JSON.
    Intent { query: String },

    /// Resolve a source path to its citation URL and title.
    Resolve { path: String },

    /// Start the JSON HTTP server on `[server].bind`.
    Serve,
}

#[derive(clap::Args)]
struct LimitArgs {
    /// Maximum number of results (overrides `[retrieval].top_k`).
    #[arg(long)]
    top_k: Option<usize>,

    /// Similarity threshold (overrides `[retrieval].min_similarity`).
    #[arg(long)]
    min_similarity: Option<f32>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if let Commands::Intent { query } = &cli.command {
        println!("{}", serde_json::to_string_pretty(&analyze_query(query))?);
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest { dry_run } => {
            ingest::run_ingest(&cfg, dry_run).await?;
        }
        Commands::Search {
            query,
            limits,
            content_type,
            role,
            language,
            json,
        } => {
            let filter = MetadataFilter {
                content_type,
                role,
                language,
                ..MetadataFilter::default()
            };
            let options = SearchOptions {
                top_k: limits.top_k,
                min_similarity: limits.min_similarity,
                filter_by: (!filter.is_empty()).then_some(filter),
            };
            search::run_search(&cfg, &query, options, json).await?;
        }
        Commands::Context { query, limits } => {
            let options = SearchOptions {
                top_k: limits.top_k,
                min_similarity: limits.min_similarity,
                filter_by: None,
            };
            search::run_context(&cfg, &query, options).await?;
        }
        Commands::Resolve { path } => {
            let mapper = search::load_mapper(&cfg)?;
            match mapper.get_content_url(&path) {
                Some(url) => {
                    println!("url: {}", url);
                    if let Some(title) = mapper.get_title(&path) {
                        println!("title: {}", title);
                    }
                }
                None => println!("No content item for {}", path),
            }
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Intent { .. } => {}
    }

    Ok(())
}
