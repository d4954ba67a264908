//! Prompt format: turn headers, end-of-turn marker and reasoning tags.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Marker closing every turn, tokenized as a special token.
    pub end_of_turn: String,
    /// Optional beginning-of-sequence marker placed once at the start.
    pub leading: Option<String>,
    pub system_header: String,
    pub user_header: String,
    pub assistant_header: String,
    pub think_open: String,
    pub think_close: String,
    /// System prompt sent as the first turn of every session.
    pub system_prompt: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            end_of_turn: "<|im_end|>".into(),
            leading: None,
            system_header: "<|im_start|>system".into(),
            user_header: "<|im_start|>user".into(),
            assistant_header: "<|im_start|>assistant".into(),
            think_open: "<think>".into(),
            think_close: "</think>".into(),
            system_prompt: String::new(),
        }
    }
}
