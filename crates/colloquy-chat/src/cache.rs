//! The token sequence actually fed to the model.
//!
//! Layout: optional leading token, then for every recorded message the
//! tokens of `header + content + end_of_turn`, then for an in-flight turn
//! the assistant header followed by the tokens generated so far.

use colloquy_common::CodecError;
use tracing::debug;

use crate::codec::{TokenCodec, TokenId};
use crate::format::PromptFormat;
use crate::message::{Message, Role};

#[derive(Debug, Clone)]
pub struct ContextCache {
    tokens: Vec<TokenId>,
    leading_token: Option<TokenId>,
    format: PromptFormat,
}

impl ContextCache {
    /// An initialized cache: empty apart from the leading token.
    pub fn new(format: PromptFormat, leading_token: Option<TokenId>) -> Self {
        let mut cache = Self {
            tokens: Vec::new(),
            leading_token,
            format,
        };
        cache.initialize();
        cache
    }

    pub fn initialize(&mut self) {
        self.tokens.clear();
        if let Some(token) = self.leading_token {
            self.tokens.push(token);
        }
    }

    /// Open a turn for `role` without closing it.
    pub fn append_header(&mut self, codec: &dyn TokenCodec, role: Role) -> Result<(), CodecError> {
        let tokens = codec.tokenize(self.format.header(role), false, true)?;
        self.tokens.extend(tokens);
        Ok(())
    }

    /// Append a complete turn, end-of-turn marker included.
    pub fn append_message(
        &mut self,
        codec: &dyn TokenCodec,
        message: &Message,
    ) -> Result<(), CodecError> {
        let text = self.format.render_turn(message.role(), message.content());
        let tokens = codec.tokenize(&text, false, true)?;
        self.tokens.extend(tokens);
        Ok(())
    }

    pub fn rebuild(&mut self, codec: &dyn TokenCodec, messages: &[Message]) -> Result<(), CodecError> {
        self.initialize();
        for message in messages {
            self.append_message(codec, message)?;
        }
        debug!(messages = messages.len(), tokens = self.used(), "cache rebuilt");
        Ok(())
    }

    pub fn push(&mut self, token: TokenId) {
        self.tokens.push(token);
    }

    /// Drop everything after the first `len` tokens.
    pub fn truncate(&mut self, len: usize) {
        self.tokens.truncate(len);
    }

    pub fn used(&self) -> usize {
        self.tokens.len()
    }

    /// Remaining room; negative when the cache already exceeds `capacity`.
    pub fn available(&self, capacity: usize) -> i64 {
        capacity as i64 - self.used() as i64
    }

    pub fn tokens(&self) -> &[TokenId] {
        &self.tokens
    }

    pub fn leading_token(&self) -> Option<TokenId> {
        self.leading_token
    }

    pub fn format(&self) -> &PromptFormat {
        &self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::echo::EchoCodec;

    fn codec() -> EchoCodec {
        EchoCodec::new(PromptFormat::chatml(), 512)
    }

    fn history() -> Vec<Message> {
        vec![
            Message::system("S"),
            Message::user("U1"),
            Message::assistant("A1"),
        ]
    }

    #[test]
    fn initialize_keeps_only_leading_token() {
        let mut cache = ContextCache::new(PromptFormat::chatml(), Some(7));
        cache.push(1);
        cache.push(2);
        cache.initialize();
        assert_eq!(cache.tokens(), &[7]);

        let mut bare = ContextCache::new(PromptFormat::chatml(), None);
        bare.push(1);
        bare.initialize();
        assert_eq!(bare.used(), 0);
    }

    #[test]
    fn append_message_matches_tokenized_turn() {
        let codec = codec();
        let mut cache = ContextCache::new(PromptFormat::chatml(), None);
        let message = Message::user("ciao");
        cache.append_message(&codec, &message).unwrap();

        let expected = codec
            .tokenize("<|im_start|>userciao<|im_end|>", false, true)
            .unwrap();
        assert_eq!(cache.tokens(), expected.as_slice());
        // end-of-turn marker is the final token
        let eot = codec.tokenize("<|im_end|>", false, true).unwrap();
        assert_eq!(cache.tokens().last(), eot.first());
    }

    #[test]
    fn append_header_does_not_close_turn() {
        let codec = codec();
        let mut cache = ContextCache::new(PromptFormat::chatml(), None);
        cache.append_header(&codec, Role::Assistant).unwrap();
        let header = codec.tokenize("<|im_start|>assistant", false, true).unwrap();
        assert_eq!(cache.tokens(), header.as_slice());
    }

    #[test]
    fn rebuild_is_idempotent() {
        let codec = codec();
        let mut cache = ContextCache::new(PromptFormat::chatml(), Some(3));
        cache.rebuild(&codec, &history()).unwrap();
        let first = cache.tokens().to_vec();
        cache.rebuild(&codec, &history()).unwrap();
        assert_eq!(cache.tokens(), first.as_slice());
        assert_eq!(first[0], 3);
    }

    #[test]
    fn rebuild_equals_incremental_appends() {
        let codec = codec();
        let mut incremental = ContextCache::new(PromptFormat::chatml(), None);
        for message in &history() {
            incremental.append_message(&codec, message).unwrap();
        }
        let mut rebuilt = ContextCache::new(PromptFormat::chatml(), None);
        rebuilt.rebuild(&codec, &history()).unwrap();
        assert_eq!(incremental.tokens(), rebuilt.tokens());
    }

    #[test]
    fn available_goes_negative_on_overflow() {
        let mut cache = ContextCache::new(PromptFormat::chatml(), None);
        for token in 0..10 {
            cache.push(token);
        }
        assert_eq!(cache.available(16), 6);
        assert_eq!(cache.available(10), 0);
        assert_eq!(cache.available(4), -6);
    }

    #[test]
    fn truncate_rolls_back_tail() {
        let mut cache = ContextCache::new(PromptFormat::chatml(), None);
        for token in 0..5 {
            cache.push(token);
        }
        cache.truncate(2);
        assert_eq!(cache.tokens(), &[0, 1]);
    }
}
