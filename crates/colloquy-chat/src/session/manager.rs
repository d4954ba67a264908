//! Session struct, turn recording and reset policy.

use std::sync::Arc;

use colloquy_common::{ChatError, CodecError, SessionId};
use tracing::{debug, info, warn};

use crate::cache::ContextCache;
use crate::codec::{TokenCodec, TokenId};
use crate::guard::ReplyGuard;
use crate::interrupt::InterruptChecker;
use crate::message::{Message, Role};
use crate::tracker::{RateTracker, ReplyStats};

use super::params::GenerationParams;
use super::turn::TurnState;

/// One conversation. Owns its history and token cache exclusively; every
/// mutation goes through the methods below so the cache always matches the
/// recorded messages between calls.
pub struct ChatSession {
    pub(super) id: SessionId,
    pub(super) codec: Arc<dyn TokenCodec>,
    pub(super) cache: ContextCache,
    pub(super) messages: Vec<Message>,
    pub(super) params: GenerationParams,
    pub(super) guard: ReplyGuard,
    /// Id of the end-of-turn marker, pushed when a reply closes normally.
    pub(super) end_of_turn: TokenId,
    pub(super) interrupt: Option<Arc<dyn InterruptChecker>>,
    pub(super) tracker: RateTracker,
    pub(super) state: TurnState,
}

/// Snapshot of the session's budget and throughput.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub tokens_used: usize,
    pub tokens_available: i64,
    pub capacity: usize,
    pub messages: usize,
    pub last_reply: Option<ReplyStats>,
    /// Replies recorded since the session started or was fully reset.
    pub replies: u64,
    pub total_tokens: u64,
    pub average_tokens_per_second: f64,
}

impl ChatSession {
    /// Resolve the marker tokens, initialize the cache and send the opening
    /// system turn when one is configured.
    pub fn new(codec: Arc<dyn TokenCodec>, params: GenerationParams) -> Result<Self, ChatError> {
        let end_of_turn = marker_token(codec.as_ref(), &params.format.end_of_turn)?;
        let leading_token = params
            .format
            .leading
            .as_deref()
            .map(|leading| marker_token(codec.as_ref(), leading))
            .transpose()?;

        let mut session = Self {
            id: SessionId::new(),
            cache: ContextCache::new(params.format.clone(), leading_token),
            guard: ReplyGuard::new(&params.format),
            codec,
            messages: Vec::new(),
            params,
            end_of_turn,
            interrupt: None,
            tracker: RateTracker::new(),
            state: TurnState::Idle,
        };

        if let Some(content) = session.params.opening_system_turn() {
            session.send(Role::System, content)?;
        }

        info!(
            session = %session.id,
            capacity = session.capacity(),
            used = session.tokens_used(),
            "chat session ready"
        );
        Ok(session)
    }

    /// Poll `checker` between generated tokens.
    pub fn with_interrupt(mut self, checker: Arc<dyn InterruptChecker>) -> Self {
        self.interrupt = Some(checker);
        self
    }

    /// Replace the grammar used from the next reply on. `None` lifts the
    /// constraint.
    pub fn set_grammar(&mut self, grammar: Option<String>) {
        self.params.sampling.grammar = grammar;
    }

    /// Record a turn and append its tokens. Returns the remaining budget,
    /// which is negative when the turn did not fit.
    pub fn send(&mut self, role: Role, content: impl Into<String>) -> Result<i64, ChatError> {
        let message = Message::new(role, content);
        self.cache.append_message(self.codec.as_ref(), &message)?;
        self.messages.push(message);

        let available = self.tokens_available();
        if available < 0 {
            warn!(session = %self.id, available, "turn exceeds the context capacity");
        }
        Ok(available)
    }

    /// Clear the cache. With `keep_system`, system turns survive and are
    /// replayed into the cache; otherwise the history is emptied.
    pub fn reset(&mut self, keep_system: bool) -> Result<(), ChatError> {
        self.cache.initialize();
        if keep_system {
            self.messages.retain(|m| m.role() == Role::System);
            self.cache.rebuild(self.codec.as_ref(), &self.messages)?;
        } else {
            self.messages.clear();
            self.tracker.reset();
        }
        debug!(
            session = %self.id,
            keep_system,
            messages = self.messages.len(),
            "session reset"
        );
        Ok(())
    }

    pub fn tokens_used(&self) -> usize {
        self.cache.used()
    }

    pub fn tokens_available(&self) -> i64 {
        self.cache.available(self.capacity())
    }

    pub fn capacity(&self) -> usize {
        self.codec.context_capacity()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn cache(&self) -> &ContextCache {
        &self.cache
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// `Idle` between calls; a turn that fails or is interrupted is rolled
    /// back and also leaves the session `Idle`.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// The whole cache as text, markers included.
    pub fn transcript(&self) -> Result<String, ChatError> {
        Ok(self.codec.detokenize(self.cache.tokens())?)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            tokens_used: self.tokens_used(),
            tokens_available: self.tokens_available(),
            capacity: self.capacity(),
            messages: self.messages.len(),
            last_reply: self.tracker.last(),
            replies: self.tracker.reply_count(),
            total_tokens: self.tracker.total_tokens(),
            average_tokens_per_second: self.tracker.average_tokens_per_second(),
        }
    }

    pub(super) fn check_context_overflow(&self) -> Result<(), ChatError> {
        if self.tokens_available() <= 0 {
            return Err(ChatError::ContextOverflow {
                used: self.tokens_used(),
                capacity: self.capacity(),
            });
        }
        Ok(())
    }
}

/// First token of `marker` tokenized with specials enabled.
fn marker_token(codec: &dyn TokenCodec, marker: &str) -> Result<TokenId, CodecError> {
    codec
        .tokenize(marker, false, true)?
        .first()
        .copied()
        .ok_or_else(|| CodecError::Tokenize(marker.to_string()))
}
