//! Turn markers of the chat template.

use colloquy_config::schema::PromptConfig;

use crate::message::Role;

/// Header strings, end-of-turn marker and optional leading marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptFormat {
    pub end_of_turn: String,
    pub leading: Option<String>,
    pub system_header: String,
    pub user_header: String,
    pub assistant_header: String,
}

impl PromptFormat {
    /// ChatML markers (`<|im_start|>role` ... `<|im_end|>`).
    pub fn chatml() -> Self {
        Self::from(&PromptConfig::default())
    }

    pub fn header(&self, role: Role) -> &str {
        match role {
            Role::System => &self.system_header,
            Role::User => &self.user_header,
            Role::Assistant => &self.assistant_header,
        }
    }

    /// `header + content + end_of_turn`, the unit a finished turn is
    /// tokenized as.
    pub fn render_turn(&self, role: Role, content: &str) -> String {
        format!("{}{}{}", self.header(role), content, self.end_of_turn)
    }

    pub fn with_leading(mut self, leading: impl Into<String>) -> Self {
        self.leading = Some(leading.into());
        self
    }
}

impl Default for PromptFormat {
    fn default() -> Self {
        Self::chatml()
    }
}

impl From<&PromptConfig> for PromptFormat {
    fn from(config: &PromptConfig) -> Self {
        Self {
            end_of_turn: config.end_of_turn.clone(),
            leading: config.leading.clone(),
            system_header: config.system_header.clone(),
            user_header: config.user_header.clone(),
            assistant_header: config.assistant_header.clone(),
        }
    }
}
