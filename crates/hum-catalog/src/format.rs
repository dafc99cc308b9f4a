//! Catalog record structures

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current BSON document version
pub const VERSION: &str = "1.0";

/// Tempo assumed for records persisted without one
pub const DEFAULT_TEMPO: f64 = 120.0;

/// One persisted catalog entry.
///
/// Field names match the JSON database written by the HumSearch web
/// service, so existing catalogs load unchanged. Missing fields take the
/// same defaults a freshly extracted fingerprint would have.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Display name
    #[serde(default = "default_name")]
    pub name: String,
    /// Playable asset, relative to the media root
    #[serde(default)]
    pub path: String,
    /// Estimated beats per minute
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Semitone deltas between adjacent note segments
    #[serde(default)]
    pub relative_pitches: Vec<i32>,
    /// Cached length of `relative_pitches`
    #[serde(default)]
    pub pitch_count: u32,
    /// Source audio length in seconds
    #[serde(default)]
    pub duration: f64,
    /// Number of detected onsets
    #[serde(default)]
    pub onset_count: u32,
}

fn default_name() -> String {
    "Unknown".to_string()
}

fn default_tempo() -> f64 {
    DEFAULT_TEMPO
}

impl CatalogRecord {
    /// Re-derive cached fields so `pitch_count` always matches the sequence.
    pub fn normalized(mut self) -> Self {
        self.pitch_count = self.relative_pitches.len() as u32;
        self
    }
}

/// On-disk encoding of a catalog file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogFormat {
    Json,
    Bson,
    #[default]
    Auto, // Detect from extension, then from content
}

impl CatalogFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => CatalogFormat::Json,
            Some("bson") => CatalogFormat::Bson,
            _ => CatalogFormat::Auto,
        }
    }

    /// Guess format from the first bytes of a file
    pub fn sniff(bytes: &[u8]) -> Self {
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'[') | Some(b'{') | None => CatalogFormat::Json,
            Some(_) => CatalogFormat::Bson,
        }
    }
}
