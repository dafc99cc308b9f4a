//! Catalog file reader and writer

use crate::error::CatalogFormatError;
use crate::format::{CatalogFormat, CatalogRecord, VERSION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// BSON wrapper document around the record list
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BsonCatalog {
    version: String,
    created_at: String,
    records: Vec<CatalogRecord>,
}

/// Complete catalog file: the ordered list of records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFile {
    pub records: Vec<CatalogRecord>,
}

impl CatalogFile {
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        Self { records }
    }

    /// Parse a JSON list of records
    pub fn from_json_str(json: &str) -> Result<Self, CatalogFormatError> {
        let records: Vec<CatalogRecord> = serde_json::from_str(json)?;
        Ok(Self::from_loaded(records))
    }

    /// Render as a pretty-printed JSON list
    pub fn to_json_string(&self) -> Result<String, CatalogFormatError> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    pub fn from_bson_slice(bytes: &[u8]) -> Result<Self, CatalogFormatError> {
        let doc: BsonCatalog = bson::from_slice(bytes)?;
        Ok(Self::from_loaded(doc.records))
    }

    pub fn to_bson_vec(&self) -> Result<Vec<u8>, CatalogFormatError> {
        let doc = BsonCatalog {
            version: VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            records: self.records.clone(),
        };
        Ok(bson::to_vec(&doc)?)
    }

    /// Load from file, resolving `Auto` from the extension or the content
    pub fn load(path: &Path, format: CatalogFormat) -> Result<Self, CatalogFormatError> {
        let bytes = std::fs::read(path).map_err(|e| CatalogFormatError::io(path, e))?;

        let format = match format {
            CatalogFormat::Auto => match CatalogFormat::from_path(path) {
                CatalogFormat::Auto => CatalogFormat::sniff(&bytes),
                detected => detected,
            },
            explicit => explicit,
        };

        match format {
            CatalogFormat::Bson => Self::from_bson_slice(&bytes),
            _ => {
                let json = String::from_utf8_lossy(&bytes);
                Self::from_json_str(&json)
            }
        }
    }

    /// Save to file, replacing any existing catalog atomically.
    ///
    /// The new content is written to a sibling temporary file and renamed
    /// over the target, so concurrent readers see either the old or the
    /// new catalog, never a partial one.
    pub fn save(&self, path: &Path, format: CatalogFormat) -> Result<(), CatalogFormatError> {
        let format = match format {
            CatalogFormat::Auto => match CatalogFormat::from_path(path) {
                CatalogFormat::Bson => CatalogFormat::Bson,
                _ => CatalogFormat::Json,
            },
            explicit => explicit,
        };

        let bytes = match format {
            CatalogFormat::Bson => self.to_bson_vec()?,
            _ => self.to_json_string()?.into_bytes(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CatalogFormatError::io(parent, e))?;
        }

        let tmp_path = temp_path_for(path);
        std::fs::write(&tmp_path, bytes).map_err(|e| CatalogFormatError::io(&tmp_path, e))?;
        std::fs::rename(&tmp_path, path).map_err(|e| CatalogFormatError::io(path, e))?;

        Ok(())
    }

    fn from_loaded(records: Vec<CatalogRecord>) -> Self {
        Self {
            records: records.into_iter().map(CatalogRecord::normalized).collect(),
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
