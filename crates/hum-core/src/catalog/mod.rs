//! Song catalog
//!
//! A catalog is an ordered list of [`CatalogEntry`] values held by a
//! [`CatalogStore`]. Matching only ever reads a snapshot of it; a rebuild
//! produces a complete new list and swaps it in with `replace`.

mod build;
mod store;

pub use build::{
    build_catalog, discover_songs, display_name, load_or_build_catalog, media_path, BuildSummary,
    SkippedSong,
};
pub use store::{CatalogStore, FileCatalogStore, MemoryCatalogStore};

use crate::fingerprint::Fingerprint;
use hum_catalog::CatalogRecord;

/// A fingerprinted song
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    /// Playable asset, relative to the media root
    pub path: String,
    pub fingerprint: Fingerprint,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>, fingerprint: Fingerprint) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            fingerprint,
        }
    }

    pub fn to_record(&self) -> CatalogRecord {
        CatalogRecord {
            name: self.name.clone(),
            path: self.path.clone(),
            tempo: self.fingerprint.tempo,
            relative_pitches: self.fingerprint.relative_pitches.clone(),
            pitch_count: self.fingerprint.pitch_count as u32,
            duration: self.fingerprint.duration,
            onset_count: self.fingerprint.onset_count as u32,
        }
    }
}

impl From<CatalogRecord> for CatalogEntry {
    fn from(record: CatalogRecord) -> Self {
        let fingerprint = Fingerprint::new(
            record.tempo,
            record.relative_pitches,
            record.duration,
            record.onset_count as usize,
        );
        Self::new(record.name, record.path, fingerprint)
    }
}
