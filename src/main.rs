//! CLI entry point: pick the pass(es) and override harvesting knobs.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, warn};

use course_harvester::application::{run_detail_pass, run_listing_pass};
use course_harvester::infrastructure::config::{ConfigSource, HarvestConfig};
use course_harvester::infrastructure::logging::init_logging_with_config;

#[derive(Debug, Parser)]
#[command(name = "course-harvester")]
#[command(about = "Harvest course listings and details from the class-search catalog")]
struct Cli {
    /// Run the listing-discovery pass only.
    #[arg(short, long)]
    listings: bool,

    /// Run the detail-harvest pass only.
    #[arg(short, long)]
    details: bool,

    /// Maximum concurrent fetch operations.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Records accumulated between snapshot flushes.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Directory holding the snapshot files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Optional JSON config file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

async fn run(cli: Cli) -> Result<()> {
    let (mut config, config_source) = HarvestConfig::load_or_default(cli.config.as_deref())?;
    if let Some(concurrency) = cli.concurrency {
        config.max_concurrent = concurrency;
    }
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    init_logging_with_config(&config.logging)?;
    if let ConfigSource::MissingFile(path) = &config_source {
        warn!("Config file {} not found, using defaults", path.display());
    }

    // Neither flag means both passes, discovery first.
    let run_both = !cli.listings && !cli.details;

    if cli.listings || run_both {
        run_listing_pass(&config).await?;
    }
    if cli.details || run_both {
        run_detail_pass(&config).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("Harvest run failed: {error:#}");
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
