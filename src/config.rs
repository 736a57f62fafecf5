// src/config.rs v2
//! Configuration management with per-user JSON storage

use crate::error::{MapError, Result};
use crate::geo::LngLat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the stored access token
pub const TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

const DEFAULT_API_BASE: &str = "https://api.mapbox.com";
const DEFAULT_TILE_URL: &str =
    "https://api.mapbox.com/styles/v1/mapbox/satellite-streets-v12/tiles/256/{z}/{x}/{y}?access_token={token}";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub access_token: Option<String>,
    pub api_base: String,
    pub tile_url: String,
    pub tile_cache_dir: Option<PathBuf>,
    pub buildings_path: Option<PathBuf>,
    pub house_numbers_path: Option<PathBuf>,
    pub initial_center: LngLat,
    pub initial_zoom: f64,
    pub initial_bearing: f64,
    pub initial_pitch: f64,
    /// Rank candidate buildings by great-circle distance instead of raw degrees
    pub great_circle_nearest: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            tile_url: DEFAULT_TILE_URL.to_string(),
            tile_cache_dir: None,
            buildings_path: None,
            house_numbers_path: None,
            initial_center: LngLat::new(-118.031, 33.977),
            initial_zoom: 18.0,
            initial_bearing: -20.0,
            initial_pitch: 60.0,
            great_circle_nearest: false,
        }
    }
}

impl MapConfig {
    /// Load configuration from the per-user file, then apply the token override
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.override_token(std::env::var(TOKEN_ENV).ok());
        Ok(config)
    }

    /// Load from an explicit path; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| MapError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| MapError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to the per-user file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MapError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| MapError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| MapError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Per-user application directory (`$HOME/.config/building-finder`)
    pub fn config_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| MapError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("building-finder"))
    }

    /// Replace the token when an override is present and non-empty
    pub fn override_token(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.access_token = Some(token.trim().to_string());
        }
    }

    /// The access token, or a config error explaining how to provide one
    pub fn access_token(&self) -> Result<&str> {
        self.access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                MapError::Config(format!(
                    "No Mapbox access token configured; set {} or pass --token",
                    TOKEN_ENV
                ))
            })
    }

    /// Tile URL for one tile, with the token substituted
    pub fn tile_url_for(&self, zoom: u8, x: u32, y: u32) -> String {
        self.tile_url
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
            .replace("{token}", self.access_token.as_deref().unwrap_or_default())
    }

    /// Tile cache directory, defaulting to a `tiles` folder next to the config file
    pub fn resolved_tile_cache_dir(&self) -> Result<PathBuf> {
        match &self.tile_cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::config_dir()?.join("tiles")),
        }
    }
}
