//! Core TOML config loading: read from path or platform default.

use crate::schema::ColloquyConfig;
use crate::validation;
use colloquy_common::ConfigError;
use std::path::Path;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};

/// Load config from a specific TOML file path.
///
/// Missing fields take serde defaults. If the parsed config fails
/// validation, a warning is logged and the default config is returned.
pub fn load_from_path(path: &Path) -> Result<ColloquyConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: ColloquyConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}");
        warn!("falling back to default config");
        return Ok(ColloquyConfig::default());
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/colloquy/config.toml`
/// On Linux: `~/.config/colloquy/config.toml`
///
/// If the file does not exist, writes the commented default and returns defaults.
pub fn load_default() -> Result<ColloquyConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, creating default", path.display());
            create_default_config(&path)?;
            Ok(ColloquyConfig::default())
        }
        Err(e) => Err(e),
    }
}
