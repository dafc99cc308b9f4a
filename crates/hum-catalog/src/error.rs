//! Catalog file errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogFormatError {
    #[error("failed to access catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode BSON catalog: {0}")]
    BsonEncode(#[from] bson::ser::Error),

    #[error("invalid BSON catalog: {0}")]
    BsonDecode(#[from] bson::de::Error),
}

impl CatalogFormatError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
