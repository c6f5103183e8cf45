//! Weapon catalog loading
//!
//! Catalogs are lists of `[[weapon]]` tables in TOML, or the equivalent
//! `{"weapon": [...]}` document in JSON.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::config::WeaponConfig;

/// Errors that can occur while loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("I/O error loading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse TOML catalog: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("weapon id '{0}' is defined more than once")]
    DuplicateId(String),

    #[error("unsupported catalog format in '{0}'")]
    UnsupportedFormat(PathBuf),
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "weapon")]
    weapons: Vec<WeaponConfig>,
}

/// Loaded weapon configurations, in file order
#[derive(Debug, Clone, Default)]
pub struct WeaponCatalog {
    weapons: Vec<Arc<WeaponConfig>>,
}

impl WeaponCatalog {
    /// Build a catalog from already constructed configs, rejecting duplicate ids
    pub fn from_configs(configs: Vec<WeaponConfig>) -> Result<Self, CatalogError> {
        let mut weapons: Vec<Arc<WeaponConfig>> = Vec::with_capacity(configs.len());
        for config in configs {
            if weapons.iter().any(|w| w.id == config.id) {
                return Err(CatalogError::DuplicateId(config.id));
            }
            weapons.push(Arc::new(config));
        }
        Ok(Self { weapons })
    }

    pub fn from_toml_str(source: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(source)?;
        Self::from_configs(file.weapons)
    }

    pub fn from_json_str(source: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(source)?;
        Self::from_configs(file.weapons)
    }

    /// Load a catalog file, picking the parser from the extension
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let is_json = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => false,
            Some("json") => true,
            _ => return Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
        };

        let contents = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(path.to_path_buf(), e))?;
        let catalog = if is_json {
            Self::from_json_str(&contents)?
        } else {
            Self::from_toml_str(&contents)?
        };

        info!(
            "Loaded {} weapons from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Look up a weapon by id
    pub fn get(&self, id: &str) -> Option<Arc<WeaponConfig>> {
        self.weapons.iter().find(|w| w.id == id).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<WeaponConfig>> {
        self.weapons.iter()
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }
}
