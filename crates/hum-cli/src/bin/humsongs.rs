//! humsongs - List catalog songs

use anyhow::Result;
use clap::Parser;
use hum_cli::output::{print_rendered, songs_json};
use hum_core::{CatalogStore, FileCatalogStore, HumServiceConfig};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "humsongs")]
#[command(about = "List the songs in the catalog", long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Catalog file to read (overrides config)
    #[arg(long)]
    catalog: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    hum_cli::init_logging(args.verbose);

    let mut config = HumServiceConfig::load_or_default(Path::new(&args.config))?;
    if let Some(catalog) = args.catalog {
        config.catalog.path = catalog;
    }

    let store = FileCatalogStore::from_config(&config.catalog);
    let songs = store.load()?;
    log::info!("{} songs in {}", songs.len(), store.path().display());

    print_rendered(songs_json(&songs));
    Ok(())
}
