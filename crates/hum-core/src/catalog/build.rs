//! Building a catalog from a directory of songs

use super::{CatalogEntry, CatalogStore, FileCatalogStore};
use crate::audio::{decode_audio, AudioFormat};
use crate::config::HumConfig;
use crate::fingerprint::FingerprintExtractor;
use anyhow::{Context, Result};
use hum_catalog::CatalogFormatError;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of a catalog rebuild
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildSummary {
    pub discovered: usize,
    pub indexed: usize,
    pub skipped: Vec<SkippedSong>,
}

/// A song left out of the catalog and why
#[derive(Debug, Clone, Serialize)]
pub struct SkippedSong {
    pub path: String,
    pub reason: String,
}

/// Audio files directly inside `songs_dir`, sorted by file name
pub fn discover_songs(songs_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(songs_dir)
        .with_context(|| format!("Failed to read songs directory {}", songs_dir.display()))?;

    let mut songs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && AudioFormat::from_path(path).is_catalog_source())
        .collect();
    songs.sort();

    Ok(songs)
}

/// Display name from a file stem: `twinkle_twinkle` becomes `Twinkle Twinkle`.
///
/// Every letter that follows a non-letter is uppercased and every other
/// letter lowercased, so `rock-n-roll` becomes `Rock-N-Roll`.
pub fn display_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    title_case(&stem.replace('_', " "))
}

fn title_case(text: &str) -> String {
    let mut after_letter = false;
    let mut titled = String::with_capacity(text.len());
    for c in text.chars() {
        if after_letter {
            titled.extend(c.to_lowercase());
        } else {
            titled.extend(c.to_uppercase());
        }
        after_letter = c.is_alphabetic();
    }
    titled
}

/// Path of `file` relative to `media_root`, with `/` separators.
///
/// Files outside the media root keep only their file name.
pub fn media_path(file: &Path, media_root: &Path) -> String {
    let relative = file
        .strip_prefix(media_root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| file.file_name().map(PathBuf::from).unwrap_or_default());

    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Fingerprint every song in `songs_dir` and replace the store's catalog.
///
/// Songs that fail to decode or produce no intervals are skipped and
/// reported in the summary. The store is replaced even when nothing was
/// indexed, so a rebuild always reflects the directory.
pub fn build_catalog(
    songs_dir: &Path,
    media_root: &Path,
    config: &HumConfig,
    store: &dyn CatalogStore,
) -> Result<BuildSummary> {
    let songs = if songs_dir.is_dir() {
        discover_songs(songs_dir)?
    } else {
        log::warn!("Songs directory {} does not exist, catalog will be empty", songs_dir.display());
        Vec::new()
    };
    log::info!("Indexing {} songs from {}", songs.len(), songs_dir.display());

    let extractor = FingerprintExtractor::new(config);

    let outcomes: Vec<Result<CatalogEntry, SkippedSong>> = songs
        .par_iter()
        .map(|path| {
            index_song(path, media_root, config, &extractor).map_err(|e| {
                log::warn!("Skipping {}: {:#}", path.display(), e);
                SkippedSong {
                    path: path.display().to_string(),
                    reason: format!("{:#}", e),
                }
            })
        })
        .collect();

    let mut entries = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(entry) => entries.push(entry),
            Err(skip) => skipped.push(skip),
        }
    }

    let summary = BuildSummary {
        discovered: songs.len(),
        indexed: entries.len(),
        skipped,
    };

    store.replace(entries)?;
    log::info!(
        "Catalog rebuilt: {} indexed, {} skipped",
        summary.indexed,
        summary.skipped.len()
    );

    Ok(summary)
}

/// Load the catalog, building it first when the file is missing or
/// unreadable as a catalog.
///
/// I/O failures other than a missing file are returned as errors.
pub fn load_or_build_catalog(
    store: &FileCatalogStore,
    songs_dir: &Path,
    media_root: &Path,
    config: &HumConfig,
) -> Result<Vec<CatalogEntry>> {
    if store.exists() {
        match store.load() {
            Ok(entries) => return Ok(entries),
            Err(e) if is_malformed(&e) => {
                log::warn!("Rebuilding unreadable catalog: {:#}", e);
            }
            Err(e) => return Err(e),
        }
    } else {
        log::info!("Catalog {} missing, building it first", store.path().display());
    }

    build_catalog(songs_dir, media_root, config, store)?;
    store.load()
}

fn is_malformed(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<CatalogFormatError>(),
        Some(CatalogFormatError::Json(_) | CatalogFormatError::BsonDecode(_))
    )
}

fn index_song(
    path: &Path,
    media_root: &Path,
    config: &HumConfig,
    extractor: &FingerprintExtractor,
) -> Result<CatalogEntry> {
    let waveform = decode_audio(path, config.sample_rate)?.into_waveform();
    let fingerprint = extractor
        .extract(&waveform)
        .with_context(|| format!("Failed to fingerprint {}", path.display()))?;

    if fingerprint.is_empty() {
        anyhow::bail!("no melodic intervals found");
    }

    log::debug!(
        "Indexed {}: tempo {:.1}, {} intervals",
        path.display(),
        fingerprint.tempo,
        fingerprint.pitch_count
    );

    Ok(CatalogEntry::new(display_name(path), media_path(path, media_root), fingerprint))
}
