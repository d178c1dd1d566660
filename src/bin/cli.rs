//! catalog-sync CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use catalog_sync::{
    error::Result,
    models::Config,
    pipeline::{self, SyncOptions, catalog},
    storage::{CatalogStorage, LocalStorage},
    utils::http::Fetcher,
};
use clap::{Parser, Subcommand};

/// catalog-sync - Legal document catalog synchronizer
#[derive(Parser, Debug)]
#[command(
    name = "catalog-sync",
    version,
    about = "Synchronize legal document listings into JSON catalogs"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/catalog.toml")]
    config: PathBuf,

    /// Output root directory (overrides `output.root_dir`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch sources, write their catalogs, then rebuild the merged view
    Sync {
        /// Only run these sources (repeatable)
        #[arg(long = "source", value_name = "NAME")]
        sources: Vec<String>,

        /// Do not rebuild the merged view
        #[arg(long)]
        skip_merge: bool,
    },

    /// Rebuild the merged view from existing per-source catalogs
    Merge,

    /// Validate the configuration file
    Validate,

    /// Show configured sources and their catalog state
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    if let Some(output) = cli.output {
        config.output.root_dir = output;
    }
    log::info!("Loaded configuration from {}", cli.config.display());

    let storage = LocalStorage::new(&config.output.root_dir);

    match cli.command {
        Command::Sync {
            sources,
            skip_merge,
        } => {
            config.validate()?;
            let fetcher = Fetcher::new(&config.fetch)?;
            let options = SyncOptions {
                sources,
                merge: !skip_merge,
            };

            let report = pipeline::run_sync(&config, &options, &fetcher, &storage).await?;

            for source in &report.sources {
                match &source.error {
                    Some(error) => log::warn!("  {}: no output ({})", source.name, error),
                    None => log::info!(
                        "  {}: {} documents{}",
                        source.name,
                        source.documents,
                        if source.changed { "" } else { " (unchanged)" }
                    ),
                }
            }
            if let Some(merge) = &report.merge {
                log::info!(
                    "  {}: {} documents{}",
                    config.output.merged_dir,
                    merge.catalog_count,
                    if merge.changed { "" } else { " (unchanged)" }
                );
            }
            log::info!(
                "Sync complete ({})",
                if report.changed() { "changes written" } else { "no changes" }
            );
        }

        Command::Merge => {
            config.validate()?;
            let outcome = pipeline::run_merge(&config, &storage).await?;
            log::info!(
                "Merged {} documents into {}{}",
                outcome.catalog_count,
                config.output.merged_dir,
                if outcome.changed { "" } else { " (unchanged)" }
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} sources, {} enabled)",
                config.sources.len(),
                config.enabled_sources().count()
            );
        }

        Command::Info => {
            log::info!("Output directory: {}", config.output.root_dir.display());

            let dirs = config
                .sources
                .iter()
                .map(|s| (s.name.as_str(), s.enabled, s.adapter.kind()))
                .chain(std::iter::once((
                    config.output.merged_dir.as_str(),
                    true,
                    "merged",
                )));

            for (name, enabled, kind) in dirs {
                let state = match storage.read_catalog(&catalog::catalog_key(name)).await {
                    Ok(Some(c)) => format!("{} documents, updated {}", c.count, c.updated_at),
                    Ok(None) => "no catalog yet".to_string(),
                    Err(e) => format!("unreadable ({e})"),
                };
                log::info!(
                    "  {} [{}{}]: {}",
                    name,
                    kind,
                    if enabled { "" } else { ", disabled" },
                    state
                );
            }
        }
    }

    Ok(())
}
