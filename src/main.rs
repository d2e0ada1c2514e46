//! # Shelfwise CLI (`shelfwise`)
//!
//! ## Usage
//!
//! ```bash
//! shelfwise --config ./config/shelfwise.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shelfwise recommend "<query>"` | Recommend books, optionally constrained by a filter spec |
//! | `shelfwise catalog` | Show record counts per category |
//!
//! Logging goes to stderr. `-v` raises the level (info, debug, trace);
//! without it `RUST_LOG` is honored, defaulting to `warn`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use shelfwise::{catalog, config, recommend};

/// Shelfwise CLI — a filter-aware book recommender.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/shelfwise.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "shelfwise",
    about = "Shelfwise — a filter-aware book recommender",
    version,
    long_about = "Shelfwise combines structured filters (author, genre, page count, \
    publication year, keywords, tone) with semantic search over book descriptions, and \
    reports a validation ledger showing how each filter narrowed the catalog."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shelfwise.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Recommend books for a free-text query.
    ///
    /// Filters are a JSON object with any of: author, genre, children,
    /// pages_min, pages_max, published_year {min, max, exact}, keywords,
    /// tone.
    Recommend {
        /// The free-text query.
        query: String,

        /// Filter spec as inline JSON.
        #[arg(long, conflicts_with = "filters_file")]
        filters: Option<String>,

        /// Read the filter spec from a JSON file.
        #[arg(long)]
        filters_file: Option<PathBuf>,

        /// Maximum number of results (overrides `retrieval.final_k`).
        #[arg(long)]
        limit: Option<usize>,

        /// Print records and ledger as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show catalog record counts per category.
    Catalog,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Recommend {
            query,
            filters,
            filters_file,
            limit,
            json,
        } => {
            let spec = recommend::parse_filters(filters.as_deref(), filters_file.as_deref())?;
            recommend::run_recommend(&cfg, &query, &spec, limit, json).await?;
        }
        Commands::Catalog => {
            catalog::run_catalog(&cfg)?;
        }
    }

    Ok(())
}
