#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
//! `groupsearch` CLI - run grouping requests over a JSONL point file
//!
//! Usage:
//!   `groupsearch groups --points ./points.jsonl --request ./request.json`
//!   `groupsearch groups --points ./points.jsonl --request - --format table < request.json`
//!   `groupsearch check-config --config ./groupsearch.toml`

mod load;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use groupsearch_core::{
    DistanceMetric, GroupRequest, GroupSearch, GroupSearchConfig, LoggingConfig,
};

#[derive(Parser)]
#[command(name = "groupsearch")]
#[command(
    author,
    version,
    about = "GroupSearch CLI - grouped vector search over in-memory points"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to ./groupsearch.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// CLI metric option
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum MetricArg {
    #[default]
    Cosine,
    Dot,
}

impl From<MetricArg> for DistanceMetric {
    fn from(m: MetricArg) -> Self {
        match m {
            MetricArg::Cosine => DistanceMetric::Cosine,
            MetricArg::Dot => DistanceMetric::DotProduct,
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum FormatArg {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a grouping request
    Groups {
        /// JSON Lines file, one `{"id", "vector", "payload"}` object per line
        #[arg(short, long)]
        points: PathBuf,

        /// Request JSON file, or `-` for stdin
        #[arg(short, long)]
        request: PathBuf,

        /// Similarity metric
        #[arg(long, value_enum, default_value = "cosine")]
        metric: MetricArg,

        /// Vector dimension (taken from the first point if not specified)
        #[arg(long)]
        dimension: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: FormatArg,

        /// Print termination reason and counters to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Validate and print the effective configuration
    CheckConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Groups {
            points,
            request,
            metric,
            dimension,
            format,
            stats,
        } => {
            let request = read_request(&request)?;
            let (collection, load_stats) = load::load_jsonl(&points, metric.into(), dimension)?;
            tracing::info!(
                lines = load_stats.total,
                loaded = load_stats.loaded,
                skipped = load_stats.errors,
                dimension = collection.dimension(),
                "points loaded"
            );

            let outcome = GroupSearch::new(&config)?.run(&collection, &request)?;
            output::print_groups(&outcome.result, format)?;
            if stats {
                output::print_stats(&outcome);
            }
        }
        Commands::CheckConfig => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<GroupSearchConfig> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            GroupSearchConfig::load_from_path(path)
        }
        None => GroupSearchConfig::load(),
    }
    .context("Failed to load configuration")?;

    config.validate()?;
    Ok(config)
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn read_request(path: &Path) -> Result<GroupRequest> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file {}", path.display()))?
    };

    serde_json::from_str(&raw).context("Invalid request JSON")
}
