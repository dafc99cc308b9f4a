//! hummatch - Query-by-humming matcher
//!
//! Usage:
//!   hummatch <query_audio>                   # Fingerprint a recording and match it
//!   hummatch --features <features.json>      # Match precomputed query features
//!   hummatch --config <path> --top-n 5 <query_audio>
//!
//! The catalog is built from the songs directory first if it does not
//! exist yet or cannot be read as a catalog.

use anyhow::{Context, Result};
use clap::Parser;
use hum_cli::output::{failure_json, match_json, print_rendered};
use hum_core::{
    fingerprint_file, load_or_build_catalog, CatalogMatcher, FileCatalogStore, Fingerprint,
    HumServiceConfig,
};
use serde::Deserialize;
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "hummatch")]
#[command(about = "Find catalog songs matching a hummed or sung query", long_about = None)]
struct Args {
    /// Query audio file, or a JSON features file with --features
    query: String,

    /// Treat the query as precomputed fingerprint JSON
    #[arg(long)]
    features: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Number of matches to return (overrides config)
    #[arg(short = 'n', long)]
    top_n: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Query features, either bare or wrapped as `{"features": {...}}`
#[derive(Deserialize)]
#[serde(untagged)]
enum FeaturesInput {
    Wrapped { features: Fingerprint },
    Bare(Fingerprint),
}

impl FeaturesInput {
    fn into_fingerprint(self) -> Fingerprint {
        match self {
            FeaturesInput::Wrapped { features } => features,
            FeaturesInput::Bare(features) => features,
        }
    }
}

fn main() {
    let args = Args::parse();
    hum_cli::init_logging(args.verbose);

    if let Err(e) = run_hummatch(&args) {
        log::error!("{:#}", e);
        print_rendered(failure_json(&format!("{:#}", e)));
        std::process::exit(1);
    }
}

fn run_hummatch(args: &Args) -> Result<()> {
    let config = HumServiceConfig::load_or_default(Path::new(&args.config))?;
    let top_n = args.top_n.unwrap_or(config.matching.top_n);
    let query_path = Path::new(&args.query);

    if !query_path.exists() {
        anyhow::bail!("Query file not found: {}", query_path.display());
    }

    let query = if args.features {
        load_features(query_path)?
    } else {
        let extraction = fingerprint_file(query_path, &config.analysis)?;
        for degradation in &extraction.degradations {
            log::info!("Query analysis degraded: {:?}", degradation);
        }
        extraction.fingerprint
    };
    log::info!(
        "Query: tempo {:.1}, {} intervals, {:.2}s",
        query.tempo,
        query.pitch_count,
        query.duration
    );

    let store = FileCatalogStore::from_config(&config.catalog);
    let catalog = load_or_build_catalog(
        &store,
        &config.songs_path(),
        Path::new(&config.catalog.media_root),
        &config.analysis,
    )?;
    if catalog.is_empty() {
        print_rendered(failure_json(&format!(
            "No songs in catalog. Add songs to {} first.",
            config.songs_path().display()
        )));
        return Ok(());
    }

    let matches = CatalogMatcher::new(&config.analysis).rank(&query, &catalog, top_n);
    log::info!("Ranked {} songs, returning {}", catalog.len(), matches.len());

    print_rendered(match_json(&query, &matches));
    Ok(())
}

fn load_features(path: &Path) -> Result<Fingerprint> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read features file {}", path.display()))?;
    let input: FeaturesInput = serde_json::from_str(&json)
        .with_context(|| format!("Invalid features JSON in {}", path.display()))?;
    Ok(input.into_fingerprint())
}
