//! humindex - Catalog builder
//!
//! Usage:
//!   humindex                          # Uses config.toml (or defaults)
//!   humindex --config <path>          # Uses custom config
//!   humindex --songs-dir <dir>        # Overrides the songs directory

use anyhow::Result;
use clap::Parser;
use hum_cli::output::print_json;
use hum_core::{build_catalog, FileCatalogStore, HumServiceConfig};
use serde::Serialize;
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "humindex")]
#[command(about = "Rebuild the song catalog from a directory of audio files", long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Directory of songs to index (overrides config)
    #[arg(long)]
    songs_dir: Option<String>,

    /// Catalog file to write (overrides config)
    #[arg(short, long)]
    output: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct IndexOutput {
    catalog: String,
    #[serde(flatten)]
    summary: hum_core::catalog::BuildSummary,
}

fn main() -> Result<()> {
    let args = Args::parse();
    hum_cli::init_logging(args.verbose);

    let mut config = HumServiceConfig::load_or_default(Path::new(&args.config))?;
    if let Some(output) = args.output {
        config.catalog.path = output;
    }
    let songs_dir = args
        .songs_dir
        .map(Into::into)
        .unwrap_or_else(|| config.songs_path());

    let store = FileCatalogStore::from_config(&config.catalog);
    log::info!("Building catalog {} from {}", store.path().display(), songs_dir.display());

    let start = std::time::Instant::now();
    let summary = build_catalog(
        &songs_dir,
        Path::new(&config.catalog.media_root),
        &config.analysis,
        &store,
    )?;
    log::info!("Catalog built in {:.2}s", start.elapsed().as_secs_f64());

    print_json(&IndexOutput {
        catalog: store.path().display().to_string(),
        summary,
    });

    Ok(())
}
