//! Names and presentation toggles used by the interactive driver.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub user_name: String,
    pub assistant_name: String,
    /// Drop reasoning segments that contain only whitespace.
    pub hide_empty_thinking: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            user_name: "utente".into(),
            assistant_name: "assistant".into(),
            hide_empty_thinking: true,
        }
    }
}
