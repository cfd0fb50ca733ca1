//! Application configuration management.
//!
//! Configuration is stored at `~/.config/pokedex-tui/config.json`.
//! `POKEDEX_API_BASE` overrides the API base URL for a single run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pokedex_core::api::API_BASE_URL;
use pokedex_core::models::SPRITE_BASE_URL;
use pokedex_core::notify::Permission;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "pokedex-tui";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Origin the bundled app shell is served from.
pub const DEFAULT_APP_ORIGIN: &str = "http://localhost:5173/";

const API_BASE_ENV: &str = "POKEDEX_API_BASE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub sprite_base_url: String,
    pub app_origin: String,
    pub notification_permission: Permission,
    pub notifications_enabled: bool,
    pub offline_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: API_BASE_URL.to_string(),
            sprite_base_url: SPRITE_BASE_URL.to_string(),
            app_origin: DEFAULT_APP_ORIGIN.to_string(),
            notification_permission: Permission::Default,
            notifications_enabled: true,
            offline_mode: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        if let Ok(base) = std::env::var(API_BASE_ENV) {
            if !base.trim().is_empty() {
                config.api_base_url = base;
            }
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Holds the log file and the `caches/` directory.
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
