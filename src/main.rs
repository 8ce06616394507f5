use anyhow::Context;
use chrono::Local;
use clap::Parser;
use dotenv::dotenv;
use log::{info, LevelFilter};
use std::path::PathBuf;

use cpi_tracker::handlers::update::{run_update, DocumentSource, UpdateConfig, DEFAULT_FILE, DEFAULT_INDICATOR};
use cpi_tracker::services::fetch::DEFAULT_SOURCE_URL;

/// Update the CPI JSON file from Trading Economics
#[derive(Parser, Debug)]
#[command(name = "cpi-update", version)]
struct Cli {
    /// Path to the CPI JSON file
    #[arg(short, long, env = "CPI_FILE", default_value = DEFAULT_FILE)]
    file: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Page holding the indicator table
    #[arg(long, env = "CPI_SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    url: String,

    /// Label of the indicator row
    #[arg(long, env = "CPI_INDICATOR", default_value = DEFAULT_INDICATOR)]
    indicator: String,

    /// Read the page from a saved HTML file instead of fetching it
    #[arg(long, value_name = "PATH")]
    html: Option<PathBuf>,

    /// Merge and log, but leave the JSON file untouched
    #[arg(long)]
    dry_run: bool,
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level);
    // RUST_LOG still wins when set
    builder.parse_default_env();
    builder.init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let source = match cli.html {
        Some(path) => DocumentSource::File(path),
        None => DocumentSource::Url(cli.url),
    };
    let config = UpdateConfig {
        file: cli.file,
        source,
        indicator: cli.indicator,
        dry_run: cli.dry_run,
    };

    let today = Local::now().date_naive();
    let summary = run_update(&config, today)
        .await
        .with_context(|| format!("CPI update of '{}' failed", config.file.display()))?;

    if summary.saved {
        info!("CPI data update completed successfully!");
    }
    Ok(())
}
