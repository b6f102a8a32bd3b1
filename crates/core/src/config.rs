//! Application configuration: defaults, an optional JSON file in the user
//! config directory and `ARMYFORGE_*` environment overrides.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{models::GameSystem, resource::DEFAULT_API_URL, save::SaveManager};

/// Application settings, read from `config.json` in the user config
/// directory and overridden by `ARMYFORGE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalogue service base URL.
    pub api_url: String,
    /// Where service responses are snapshotted.
    pub cache_root: PathBuf,
    /// Where save files are written.
    pub save_root: PathBuf,
    /// System preselected for new lists.
    #[serde(default)]
    pub game_system: Option<GameSystem>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            cache_root: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("armyforge"),
            save_root: SaveManager::default_root(),
            game_system: None,
        }
    }
}

impl AppConfig {
    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = AppConfig::default();
        let settings = Config::builder()
            .set_default("api_url", defaults.api_url)?
            .set_default("cache_root", defaults.cache_root.to_string_lossy().to_string())?
            .set_default("save_root", defaults.save_root.to_string_lossy().to_string())?
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Json).required(false))
            .add_source(Environment::with_prefix("ARMYFORGE"))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        settings
            .try_deserialize()
            .context("invalid configuration")
    }
}

/// `armyforge` under the user's config directory.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("armyforge")
}

/// Default config file location.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Write the default config on first run.
pub fn ensure_default_config() -> Result<()> {
    ensure_default_config_at(&config_path())
}

/// Write the default config to `path` unless a file is already there.
pub fn ensure_default_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let serialised = serde_json::to_string_pretty(&AppConfig::default())?;
    fs::write(path, serialised).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote default config to {}", path.display());
    Ok(())
}
