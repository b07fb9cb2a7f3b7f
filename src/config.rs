//! Application configuration
//!
//! Stored as JSON. Default location: `<config dir>/rusty-fourier/config.json`,
//! overridable with the `RUSTY_FOURIER_CONFIG` environment variable.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::model::ShapeKind;
use crate::render::SpectrumPalette;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "RUSTY_FOURIER_CONFIG";

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Session store limits
    pub store: StoreConfig,
    /// Shape selected when the editor starts
    pub default_shape: ShapeKind,
    /// Border thickness (pixels) for hollow rectangles and rings
    pub default_thickness: u32,
    /// Colouring of the spectrum pane
    pub palette: SpectrumPalette,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            default_shape: ShapeKind::Rectangle,
            default_thickness: 5,
            palette: SpectrumPalette::Gray,
        }
    }
}

/// Limits applied by the session store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Live sessions kept before the least recently used one is evicted
    pub max_sessions: usize,
    /// Largest accepted image width or height, in pixels
    pub max_dimension: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: 16,
            max_dimension: 4096,
        }
    }
}

/// `$RUSTY_FOURIER_CONFIG`, else the per-user config directory.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("rusty-fourier").join("config.json"))
}

/// Load configuration from a JSON file.
///
/// A missing file yields the defaults; an unreadable or invalid one logs a
/// warning and also yields the defaults.
pub fn load_config(path: &Path) -> AppConfig {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return AppConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("load_config: Failed to parse config: {e}, using defaults");
                AppConfig::default()
            }
        },
        Err(e) => {
            log::warn!("load_config: Failed to read config file: {e}, using defaults");
            AppConfig::default()
        }
    }
}

/// Write configuration as pretty JSON, creating parent directories.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write config file: {:?}", path))?;
    log::info!("save_config: Config saved to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config = load_config(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = AppConfig {
            store: StoreConfig {
                max_sessions: 3,
                max_dimension: 512,
            },
            default_shape: ShapeKind::Ring,
            default_thickness: 9,
            palette: SpectrumPalette::Heat,
        };
        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "store": { "max_sessions": 2 } }"#).unwrap();

        let config = load_config(&path);
        assert_eq!(config.store.max_sessions, 2);
        assert_eq!(config.store.max_dimension, 4096);
        assert_eq!(config.default_thickness, 5);
    }

    #[test]
    fn test_invalid_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path), AppConfig::default());
    }
}
