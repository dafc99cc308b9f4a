//! Service configuration for HumSearch
//!
//! Provides TOML-based configuration for locating the catalog, the songs
//! it is built from, and the matching parameters used by the CLI tools.

use crate::config::HumConfig;
use hum_catalog::CatalogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HumServiceConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub analysis: HumConfig,
}

/// Catalog location and build sources
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: String,
    #[serde(default)]
    pub format: CatalogFormat,
    #[serde(default = "default_media_root")]
    pub media_root: String,
    #[serde(default = "default_songs_dir")]
    pub songs_dir: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            format: CatalogFormat::default(),
            media_root: default_media_root(),
            songs_dir: default_songs_dir(),
        }
    }
}

fn default_catalog_path() -> String {
    "./song_database.json".to_string()
}
fn default_media_root() -> String {
    "./media".to_string()
}
fn default_songs_dir() -> String {
    "songs".to_string()
}

/// Matching configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

fn default_top_n() -> usize {
    crate::matching::DEFAULT_TOP_N
}

impl HumServiceConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: HumServiceConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
        config.analysis.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("No config at {}, using defaults", path.display());
            Ok(Self::default_filesystem())
        }
    }

    /// Create a default filesystem configuration
    pub fn default_filesystem() -> Self {
        Self::default()
    }

    /// Directory scanned for catalog songs
    pub fn songs_path(&self) -> PathBuf {
        Path::new(&self.catalog.media_root).join(&self.catalog.songs_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filesystem_config() {
        let config = HumServiceConfig::default_filesystem();
        assert_eq!(config.catalog.path, "./song_database.json");
        assert_eq!(config.catalog.format, CatalogFormat::Auto);
        assert_eq!(config.matching.top_n, 3);
        assert_eq!(config.songs_path(), PathBuf::from("./media/songs"));
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [catalog]
            path = "./db/catalog.bson"
            format = "bson"
            media_root = "/srv/media"

            [matching]
            top_n = 5

            [analysis]
            max_interval = 12
        "#;

        let config: HumServiceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.catalog.path, "./db/catalog.bson");
        assert_eq!(config.catalog.format, CatalogFormat::Bson);
        assert_eq!(config.catalog.songs_dir, "songs");
        assert_eq!(config.matching.top_n, 5);
        assert_eq!(config.analysis.max_interval, 12);
        assert_eq!(config.analysis.sample_rate, 22050);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: HumServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.matching.top_n, 3);
        assert_eq!(config.analysis, HumConfig::default());
    }
}
