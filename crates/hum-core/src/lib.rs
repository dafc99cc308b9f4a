//! HumSearch Core - Query-by-Humming Library
//!
//! Converts hummed or sung audio into melodic fingerprints (tempo plus
//! semitone steps between notes) and ranks a catalog of songs by how
//! closely their fingerprints match.

pub mod analysis;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod fingerprint;
pub mod matching;
pub mod similarity;
pub mod storage_config;
pub mod transform;

pub use analysis::{AnalysisError, SignalAnalyzer, SpectralAnalyzer};
pub use audio::Waveform;
pub use catalog::{build_catalog, load_or_build_catalog, CatalogEntry, CatalogStore, FileCatalogStore, MemoryCatalogStore};
pub use config::HumConfig;
pub use fingerprint::{Degradation, ExtractError, Extraction, Fingerprint, FingerprintExtractor};
pub use matching::{rank, CatalogMatcher, MatchResult, DEFAULT_TOP_N};
pub use similarity::{score, SimilarityScorer};
pub use storage_config::HumServiceConfig;

use anyhow::Context;
use std::path::Path;

/// Fingerprint an audio file
pub fn fingerprint_file(audio_path: &Path, config: &HumConfig) -> anyhow::Result<Extraction> {
    // Decode to mono at the analysis rate
    let waveform = audio::decode_audio(audio_path, config.sample_rate)?.into_waveform();

    let extraction = FingerprintExtractor::new(config)
        .extract_detailed(&waveform)
        .with_context(|| format!("Failed to fingerprint {}", audio_path.display()))?;

    Ok(extraction)
}
