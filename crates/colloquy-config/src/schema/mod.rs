//! Configuration schema types for Colloquy.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with defaults matching a ChatML-style model.

mod display;
mod generation;
mod logging;
mod model;
mod prompt;

pub use display::*;
pub use generation::*;
pub use logging::*;
pub use model::*;
pub use prompt::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Colloquy.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ColloquyConfig {
    pub model: ModelConfig,
    pub generation: GenerationConfig,
    pub prompt: PromptConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}
