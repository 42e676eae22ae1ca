//! Coastal-Sites main entry point
//!
//! This is the command-line interface for the Coastal-Sites collector.

use anyhow::{bail, Context};
use clap::Parser;
use coastal_sites::collect::{collect, SourceKind};
use coastal_sites::config::{load_config_with_hash, Config};
use coastal_sites::output::{load_statistics, log_report, print_statistics};
use coastal_sites::storage::CsvStore;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Coastal-Sites: a resumable collector for Hawaii coastal recreation sites
///
/// Collects sites from the Places API and from a tourism website into CSV
/// files. Interrupted runs resume where they stopped: sites already in the
/// output file are never fetched or written again.
#[derive(Parser, Debug)]
#[command(name = "coastal-sites")]
#[command(version = "1.0.0")]
#[command(about = "A resumable collector for Hawaii coastal recreation sites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Collect from this source only (default: every configured source)
    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    /// Validate config and show what would be collected without any request
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the output files and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let sources = select_sources(&config, cli.source)?;

    if cli.dry_run {
        handle_dry_run(&config, &sources);
    } else if cli.stats {
        handle_stats(&config, &sources)?;
    } else {
        handle_collect(&config, &sources).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("coastal_sites=info,warn"),
            1 => EnvFilter::new("coastal_sites=debug,info"),
            2 => EnvFilter::new("coastal_sites=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn select_sources(
    config: &Config,
    requested: Option<SourceKind>,
) -> anyhow::Result<Vec<SourceKind>> {
    let configured = SourceKind::configured(config);
    match requested {
        Some(kind) if !configured.contains(&kind) => {
            bail!("source '{}' has no section in the configuration", kind)
        }
        Some(kind) => Ok(vec![kind]),
        None => Ok(configured),
    }
}

/// Handles the --dry-run mode: shows groups and search terms per source
fn handle_dry_run(config: &Config, sources: &[SourceKind]) {
    println!("=== Coastal-Sites Dry Run ===\n");

    println!("Collector:");
    println!("  Request timeout: {}s", config.collector.request_timeout_secs);
    println!("  Delay between items: {}ms", config.collector.item_delay_ms);

    for kind in sources {
        match kind {
            SourceKind::Places => {
                let Some(places) = &config.places else { continue };
                println!("\nPlaces API -> {}", places.output_path);
                println!("  Endpoint: {}", places.base_url);
                println!("  API key file: {}", places.api_key_path);
                println!("  Search terms: {}", places.search_terms.join(", "));
                println!(
                    "  Pages per term: {} ({}ms apart)",
                    places.max_pages, places.page_delay_ms
                );
                if !places.exclude_types.is_empty() {
                    println!("  Excluded types: {}", places.exclude_types.join(", "));
                }
                for island in &places.islands {
                    println!(
                        "  - {} ({}, {}) radius {:.0}m",
                        island.name,
                        island.latitude,
                        island.longitude,
                        island.radius_meters()
                    );
                }
            }
            SourceKind::Tourism => {
                let Some(tourism) = &config.tourism else { continue };
                println!("\nTourism site -> {}", tourism.output_path);
                for island in &tourism.islands {
                    println!(
                        "  - {} ({}/{}/beaches/)",
                        island.display_name(),
                        tourism.base_url.trim_end_matches('/'),
                        island.slug
                    );
                }
            }
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: summarizes each output file
fn handle_stats(config: &Config, sources: &[SourceKind]) -> anyhow::Result<()> {
    for kind in sources {
        let Some(path) = kind.output_path(config) else {
            continue;
        };

        let store = CsvStore::open(Path::new(path), kind.identifier_field())
            .with_context(|| format!("Failed to open {}", path))?;
        print_statistics(&load_statistics(&store));
    }

    Ok(())
}

/// Handles the main collection run, one source after the other
async fn handle_collect(config: &Config, sources: &[SourceKind]) -> anyhow::Result<()> {
    for kind in sources {
        tracing::info!("Starting {} collection", kind);

        match collect(config, *kind).await {
            Ok(report) => log_report(*kind, &report),
            Err(e) => {
                tracing::error!("{} collection failed: {}", kind, e);
                return Err(e).with_context(|| format!("{} collection failed", kind));
            }
        }
    }

    tracing::info!("Data collection and export complete");
    Ok(())
}
