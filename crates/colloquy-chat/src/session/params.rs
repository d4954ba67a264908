//! Per-session generation parameters, fixed at construction.

use colloquy_config::ColloquyConfig;

use crate::codec::SamplingParams;
use crate::format::PromptFormat;

#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub sampling: SamplingParams,
    pub format: PromptFormat,
    /// Sent as the opening system turn when non-empty.
    pub system_prompt: String,
    /// When false, the opening system turn carries `/no_think`.
    pub thinking: bool,
    pub debug: bool,
}

impl GenerationParams {
    pub fn new(format: PromptFormat) -> Self {
        Self {
            max_new_tokens: 1024,
            sampling: SamplingParams::default(),
            format,
            system_prompt: String::new(),
            thinking: true,
            debug: false,
        }
    }

    pub fn with_max_new_tokens(mut self, max: u32) -> Self {
        self.max_new_tokens = max;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    /// Constrain every reply with a GBNF grammar.
    pub fn with_grammar(mut self, grammar: impl Into<String>) -> Self {
        self.sampling.grammar = Some(grammar.into());
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_thinking(mut self, thinking: bool) -> Self {
        self.thinking = thinking;
        self
    }

    /// The opening system turn, if any.
    pub(crate) fn opening_system_turn(&self) -> Option<String> {
        let content = if self.thinking {
            self.system_prompt.trim().to_string()
        } else {
            format!("{}\n\n/no_think", self.system_prompt)
                .trim()
                .to_string()
        };
        (!content.is_empty()).then_some(content)
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(PromptFormat::chatml())
    }
}

impl From<&ColloquyConfig> for GenerationParams {
    fn from(config: &ColloquyConfig) -> Self {
        Self {
            max_new_tokens: config.generation.max_new_tokens,
            sampling: SamplingParams {
                temperature: config.generation.temperature,
                top_p: config.generation.top_p,
                top_k: config.generation.top_k,
                grammar: config.generation.grammar.clone(),
            },
            format: PromptFormat::from(&config.prompt),
            system_prompt: config.prompt.system_prompt.clone(),
            thinking: config.generation.thinking,
            debug: config.logging.debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_think_directive_when_thinking_disabled() {
        let params = GenerationParams::default()
            .with_system_prompt("Sii breve.")
            .with_thinking(false);
        assert_eq!(
            params.opening_system_turn().as_deref(),
            Some("Sii breve.\n\n/no_think")
        );
    }

    #[test]
    fn empty_prompt_without_directive_sends_nothing() {
        let params = GenerationParams::default().with_thinking(true);
        assert_eq!(params.opening_system_turn(), None);

        let params = params.with_thinking(false);
        assert_eq!(params.opening_system_turn().as_deref(), Some("/no_think"));
    }

    #[test]
    fn from_config_copies_everything() {
        let mut config = ColloquyConfig::default();
        config.generation.max_new_tokens = 7;
        config.generation.top_k = 3;
        config.generation.grammar = Some("root ::= \"ok\"".into());
        config.prompt.system_prompt = "S".into();
        config.logging.debug = true;

        let params = GenerationParams::from(&config);
        assert_eq!(params.max_new_tokens, 7);
        assert_eq!(params.sampling.top_k, 3);
        assert_eq!(params.sampling.grammar.as_deref(), Some("root ::= \"ok\""));
        assert_eq!(params.system_prompt, "S");
        assert!(!params.thinking);
        assert!(params.debug);
        assert_eq!(params.format.end_of_turn, "<|im_end|>");
    }
}
