//! Model backend configuration.

use serde::{Deserialize, Serialize};

/// Settings for the token backend the session talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Display name of the loaded model.
    pub name: String,
    /// Maximum number of tokens the backend can condition on (valid range: 16-1048576).
    pub context_size: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "echo".into(),
            context_size: 2048,
        }
    }
}
