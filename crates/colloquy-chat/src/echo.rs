//! Echo backend.
//!
//! A self-contained [`TokenCodec`] that does not run a model: one token per
//! character plus dedicated ids for the template markers, and a generator
//! that replays the most recent user turn before emitting end-of-sequence.
//! Used for dry runs of the driver and in tests.

use std::collections::HashMap;

use colloquy_common::CodecError;
use tracing::debug;

use crate::codec::{SamplingParams, TokenCodec, TokenId, TokenStream};
use crate::format::PromptFormat;

/// Rendering of the end-of-sequence id.
pub const END_OF_SEQUENCE: &str = "<|endoftext|>";

const EOS_ID: TokenId = 0;
const CHAR_BASE: TokenId = 1024;

#[derive(Debug, Clone)]
pub struct EchoCodec {
    /// Special markers, longest first so overlapping prefixes resolve greedily.
    specials: Vec<(String, TokenId)>,
    by_id: HashMap<TokenId, String>,
    leading: Option<TokenId>,
    user_header: TokenId,
    end_of_turn: TokenId,
    capacity: usize,
}

impl EchoCodec {
    pub fn new(format: PromptFormat, capacity: usize) -> Self {
        let mut codec = Self {
            specials: Vec::new(),
            by_id: HashMap::new(),
            leading: None,
            user_header: EOS_ID,
            end_of_turn: EOS_ID,
            capacity,
        };
        codec.register(END_OF_SEQUENCE);
        codec.end_of_turn = codec.register(&format.end_of_turn);
        codec.register(&format.system_header);
        codec.user_header = codec.register(&format.user_header);
        codec.register(&format.assistant_header);
        if let Some(leading) = &format.leading {
            codec.leading = Some(codec.register(leading));
        }
        codec
    }

    /// Parse `marker` as a single token when tokenizing with specials.
    pub fn with_special(mut self, marker: &str) -> Self {
        self.register(marker);
        self
    }

    fn register(&mut self, marker: &str) -> TokenId {
        if let Some((_, id)) = self.specials.iter().find(|(s, _)| s == marker) {
            return *id;
        }
        let id = self.specials.len() as TokenId;
        self.specials.push((marker.to_string(), id));
        self.specials.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self.by_id.insert(id, marker.to_string());
        id
    }

    fn special_at(&self, rest: &str) -> Option<(usize, TokenId)> {
        self.specials
            .iter()
            .find(|(marker, _)| !marker.is_empty() && rest.starts_with(marker.as_str()))
            .map(|(marker, id)| (marker.len(), *id))
    }

    /// Tokens of the last user turn in `prefix`, without header and marker.
    fn last_user_turn(&self, prefix: &[TokenId]) -> Vec<TokenId> {
        let Some(start) = prefix.iter().rposition(|&t| t == self.user_header) else {
            return Vec::new();
        };
        prefix[start + 1..]
            .iter()
            .take_while(|&&t| t != self.end_of_turn)
            .copied()
            .collect()
    }
}

impl TokenCodec for EchoCodec {
    fn tokenize(
        &self,
        text: &str,
        add_leading: bool,
        special: bool,
    ) -> Result<Vec<TokenId>, CodecError> {
        let mut tokens = Vec::with_capacity(text.len() + 1);
        if add_leading {
            if let Some(leading) = self.leading {
                tokens.push(leading);
            }
        }

        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            if special {
                if let Some((len, id)) = self.special_at(rest) {
                    tokens.push(id);
                    pos += len;
                    continue;
                }
            }
            let Some(c) = rest.chars().next() else {
                return Err(CodecError::Tokenize(text.to_string()));
            };
            tokens.push(CHAR_BASE + c as TokenId);
            pos += c.len_utf8();
        }
        Ok(tokens)
    }

    fn detokenize(&self, tokens: &[TokenId]) -> Result<String, CodecError> {
        let mut text = String::new();
        for &token in tokens {
            if token >= CHAR_BASE {
                if let Some(c) = char::from_u32((token - CHAR_BASE) as u32) {
                    text.push(c);
                }
            } else if let Some(marker) = self.by_id.get(&token) {
                text.push_str(marker);
            }
        }
        Ok(text)
    }

    fn context_capacity(&self) -> usize {
        self.capacity
    }

    fn end_of_sequence(&self) -> TokenId {
        EOS_ID
    }

    fn generate(&self, prefix: &[TokenId], sampling: &SamplingParams) -> TokenStream {
        debug!(
            prefix = prefix.len(),
            temperature = sampling.temperature,
            top_p = sampling.top_p,
            top_k = sampling.top_k,
            grammar = sampling.grammar.is_some(),
            "echo generation started"
        );
        let reply = self.last_user_turn(prefix);
        Box::new(reply.into_iter().chain(std::iter::repeat(EOS_ID)))
    }
}
