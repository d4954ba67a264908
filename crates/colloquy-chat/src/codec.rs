//! The narrow interface the session needs from a language model.
//!
//! Tokenizer, detokenizer and sampler all live behind [`TokenCodec`]; the
//! session only decides when to stop pulling tokens.

use colloquy_common::CodecError;

/// Vocabulary index, signed to match llama.cpp's `llama_token`.
pub type TokenId = i32;

/// Lazily sampled continuation of a prefix. Unbounded until the consumer
/// stops pulling.
pub type TokenStream = Box<dyn Iterator<Item = TokenId>>;

/// Sampling knobs forwarded untouched to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    /// GBNF grammar constraining the output. Backends without grammar
    /// support ignore it.
    pub grammar: Option<String>,
}

impl SamplingParams {
    pub fn with_grammar(mut self, grammar: impl Into<String>) -> Self {
        self.grammar = Some(grammar.into());
        self
    }
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            top_p: 0.9,
            top_k: 40,
            grammar: None,
        }
    }
}

pub trait TokenCodec {
    /// Convert text to tokens. `add_leading` prepends the model's
    /// beginning-of-sequence token; `special` parses control markers such
    /// as `<|im_end|>` into their dedicated ids instead of plain text.
    fn tokenize(
        &self,
        text: &str,
        add_leading: bool,
        special: bool,
    ) -> Result<Vec<TokenId>, CodecError>;

    /// Convert tokens back to text. Invalid byte sequences are dropped.
    fn detokenize(&self, tokens: &[TokenId]) -> Result<String, CodecError>;

    fn context_capacity(&self) -> usize;

    fn end_of_sequence(&self) -> TokenId;

    /// Start sampling a continuation of `prefix`.
    fn generate(&self, prefix: &[TokenId], sampling: &SamplingParams) -> TokenStream;
}
