//! Generation parameters passed through to the sampler.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Upper bound on tokens generated in a single assistant turn.
    pub max_new_tokens: u32,
    /// Sampling temperature (valid range: 0.0-2.0).
    pub temperature: f32,
    /// Nucleus sampling threshold (valid range: 0.0-1.0).
    pub top_p: f32,
    /// Top-k cutoff (valid range: 0-1000, 0 disables).
    pub top_k: u32,
    /// Let the model emit reasoning segments. When disabled the system
    /// turn carries a `/no_think` directive.
    pub thinking: bool,
    /// GBNF grammar constraining every reply. Unset: unconstrained.
    pub grammar: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: 1024,
            temperature: 0.8,
            top_p: 0.9,
            top_k: 40,
            thinking: false,
            grammar: None,
        }
    }
}
