//! textbook-scanner CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use textbook_scanner::{
    error::Result,
    models::Config,
    pipeline::{self, ScanOptions},
    storage::LocalStorage,
};

/// textbook-scanner - Location-aware textbook data generator
#[derive(Parser, Debug)]
#[command(
    name = "textbook-scanner",
    version,
    about = "Generates location-aware download data for TapXWorld/ChinaTextbook"
)]
struct Cli {
    /// Path to storage directory containing config and cache files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the repository and generate the data file
    Scan {
        /// Skip CDN probing (direct URLs only)
        #[arg(long)]
        offline: bool,

        /// Refetch the repository tree even if a cache exists
        #[arg(long)]
        refresh: bool,

        /// Output file path (default: {storage_dir}/textbook-data.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate configuration files
    Validate,

    /// Show cache and output status
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

    log::info!("textbook-scanner starting...");

    // Load configuration
    let config_path = cli.storage_dir.join("config.toml");
    let config = Arc::new(Config::load_or_default(&config_path));

    match cli.command {
        Command::Scan {
            offline,
            refresh,
            output,
        } => {
            let mut storage = LocalStorage::new(&cli.storage_dir);
            if let Some(path) = output {
                storage = storage.with_output(path);
            }

            let options = ScanOptions { offline, refresh };
            let outcome = pipeline::run_scan(Arc::clone(&config), &storage, &options).await?;

            log::info!(
                "Scan complete: {} records ({} unclassifiable dropped)",
                outcome.record_count,
                outcome.dropped_unknown
            );
        }

        Command::Validate => {
            pipeline::run_validate(&config)?;
            log::info!("All validations passed!");
        }

        Command::Info => {
            let storage = LocalStorage::new(&cli.storage_dir);
            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!(
                "Tree cache: {}",
                if storage.tree_cache_path().exists() {
                    "exists"
                } else {
                    "not found"
                }
            );
            log::info!(
                "Output: {}",
                if storage.output_path().exists() {
                    "exists"
                } else {
                    "not found"
                }
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
