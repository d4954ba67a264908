//! Colloquy configuration.
//!
//! TOML-based configuration for the chat session: model capacity,
//! generation parameters, prompt format markers, display names and
//! logging. Every section uses serde defaults so partial files work.
//!
//! ```rust,no_run
//! use colloquy_config::{config_to_json, load_config};
//!
//! let config = load_config().expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{ColloquyConfig, CONFIG_SCHEMA_VERSION};
pub use toml_loader::{default_config_path, load_default, load_from_path};

use colloquy_common::ConfigError;
use std::path::Path;

/// Load config from the platform default path, creating it if missing.
pub fn load_config() -> Result<ColloquyConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load config from an explicit override path, or the default location.
pub fn load_config_from(path: Option<&Path>) -> Result<ColloquyConfig, ConfigError> {
    match path {
        Some(path) => toml_loader::load_from_path(path),
        None => load_config(),
    }
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &ColloquyConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
