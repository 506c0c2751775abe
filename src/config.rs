use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::db::PROJECTS_COLLECTION;

/// Settings read from a TOML file; every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub store: StoreConfig,
    pub images: ImageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file holding the project documents.
    pub database: PathBuf,
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("linesheet.db"),
            collection: PROJECTS_COLLECTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Longest side, in pixels, after downscaling.
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_dimension: 600,
            jpeg_quality: 70,
        }
    }
}

impl CatalogConfig {
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(toml_str).context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to load config {:?}", path))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store.collection.is_empty() {
            anyhow::bail!("store.collection must not be empty");
        }
        if self.images.max_dimension == 0 {
            anyhow::bail!("images.max_dimension must be positive");
        }
        if !(1..=100).contains(&self.images.jpeg_quality) {
            anyhow::bail!(
                "images.jpeg_quality must be between 1 and 100, got {}",
                self.images.jpeg_quality
            );
        }
        Ok(())
    }
}
