//! Catalog storage backends

use super::CatalogEntry;
use crate::storage_config::CatalogConfig;
use anyhow::{Context, Result};
use hum_catalog::{CatalogFile, CatalogFormat};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

/// Where the catalog lives.
///
/// `load` may return an empty list; that is a valid catalog with nothing
/// to match. `replace` must be atomic with respect to `load`.
pub trait CatalogStore: Send + Sync {
    /// All entries in catalog order
    fn load(&self) -> Result<Vec<CatalogEntry>>;

    /// Add one entry at the end
    fn append(&self, entry: CatalogEntry) -> Result<()>;

    /// Swap in a complete new catalog
    fn replace(&self, entries: Vec<CatalogEntry>) -> Result<()>;
}

/// Catalog persisted as a single JSON or BSON file
pub struct FileCatalogStore {
    path: PathBuf,
    format: CatalogFormat,
    // Serializes read-modify-write appends
    write_lock: Mutex<()>,
}

impl FileCatalogStore {
    pub fn new(path: impl Into<PathBuf>, format: CatalogFormat) -> Self {
        Self {
            path: path.into(),
            format,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(&config.path, config.format)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn save(&self, entries: &[CatalogEntry]) -> Result<()> {
        let file = CatalogFile::new(entries.iter().map(CatalogEntry::to_record).collect());
        file.save(&self.path, self.format)
            .with_context(|| format!("Failed to write catalog {}", self.path.display()))
    }
}

impl CatalogStore for FileCatalogStore {
    fn load(&self) -> Result<Vec<CatalogEntry>> {
        if !self.path.exists() {
            log::info!("Catalog {} does not exist yet", self.path.display());
            return Ok(Vec::new());
        }

        let file = CatalogFile::load(&self.path, self.format)
            .with_context(|| format!("Failed to read catalog {}", self.path.display()))?;

        log::debug!("Loaded {} catalog records from {}", file.records.len(), self.path.display());
        Ok(file.records.into_iter().map(CatalogEntry::from).collect())
    }

    fn append(&self, entry: CatalogEntry) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        entries.push(entry);
        self.save(&entries)
    }

    fn replace(&self, entries: Vec<CatalogEntry>) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.save(&entries)?;
        log::info!("Wrote {} catalog entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

/// In-process catalog with copy-on-write snapshots.
///
/// Readers hold an `Arc` to the list they loaded; writers never touch a
/// list that is still shared, so a snapshot stays valid while the store
/// moves on.
#[derive(Default)]
pub struct MemoryCatalogStore {
    entries: RwLock<Arc<Vec<CatalogEntry>>>,
}

impl MemoryCatalogStore {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries: RwLock::new(Arc::new(entries)),
        }
    }

    /// Current catalog without copying it
    pub fn snapshot(&self) -> Arc<Vec<CatalogEntry>> {
        let guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn load(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.snapshot().as_ref().clone())
    }

    fn append(&self, entry: CatalogEntry) -> Result<()> {
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Arc::make_mut(&mut guard).push(entry);
        Ok(())
    }

    fn replace(&self, entries: Vec<CatalogEntry>) -> Result<()> {
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(entries);
        Ok(())
    }
}
