//! The per-turn state machine shared by both reply modes.
//!
//! A turn opens the assistant header, pulls tokens until something ends it
//! and then either records the reply or rolls the cache back to where the
//! turn started. Full and stepped generation drive the same `step`.

use std::time::Instant;

use colloquy_common::{new_turn_id, ChatError};
use serde::Serialize;
use tracing::{debug, debug_span, Span};

use crate::codec::TokenStream;
use crate::guard::GuardTrigger;
use crate::message::{Message, Role};
use crate::tracker::ReplyStats;

use super::manager::ChatSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Idle,
    HeaderEmitted,
    Generating,
    Terminated,
}

/// Why a reply stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// End-of-sequence or end-of-turn token, or the model ran dry.
    EndOfSequence,
    /// `max_new_tokens` tokens were accepted.
    TokenBudget,
    /// The end-of-turn marker showed up as plain text.
    EscapedTerminator,
    /// The model started a turn for this role.
    Impersonation(Role),
    /// Stopped by the interrupt checker; nothing was recorded.
    Interrupted,
}

impl From<GuardTrigger> for FinishReason {
    fn from(trigger: GuardTrigger) -> Self {
        match trigger {
            GuardTrigger::EscapedTerminator => Self::EscapedTerminator,
            GuardTrigger::Impersonation(role) => Self::Impersonation(role),
        }
    }
}

pub(crate) enum Step {
    /// Text of the token just accepted.
    Token(String),
    Finished(FinishReason),
}

/// One in-flight assistant turn.
pub(crate) struct Turn {
    /// Created on the first step, after the overflow check.
    generator: Option<TokenStream>,
    pub(crate) reply: String,
    accepted: u32,
    /// Cache length before the header; rollback and re-encode start here.
    rollback_len: usize,
    started: Instant,
    span: Span,
}

impl ChatSession {
    /// Append the assistant header and open a turn.
    pub(crate) fn begin_turn(&mut self) -> Result<Turn, ChatError> {
        let span = debug_span!("turn", session = %self.id, turn = %new_turn_id());
        let rollback_len = self.cache.used();
        {
            let _enter = span.enter();
            self.cache.append_header(self.codec.as_ref(), Role::Assistant)?;
            self.state = TurnState::HeaderEmitted;
            debug!(used = self.cache.used(), "assistant header appended");
        }
        Ok(Turn {
            generator: None,
            reply: String::new(),
            accepted: 0,
            rollback_len,
            started: Instant::now(),
            span,
        })
    }

    /// Pull one token and apply every stop rule to it. On error the turn is
    /// rolled back before the error is returned.
    pub(crate) fn step(&mut self, turn: &mut Turn) -> Result<Step, ChatError> {
        let span = turn.span.clone();
        let _enter = span.enter();

        let result = self.advance(turn);
        if let Err(err) = &result {
            debug!(%err, "turn failed");
            self.abort_turn(turn);
        }
        result
    }

    fn advance(&mut self, turn: &mut Turn) -> Result<Step, ChatError> {
        if self.interrupt.as_ref().is_some_and(|c| c.is_interrupted()) {
            self.abort_turn(turn);
            return Ok(Step::Finished(FinishReason::Interrupted));
        }

        self.check_context_overflow()?;

        let generator = turn.generator.get_or_insert_with(|| {
            self.state = TurnState::Generating;
            self.codec.generate(self.cache.tokens(), &self.params.sampling)
        });

        let token = match generator.next() {
            Some(token)
                if token != self.codec.end_of_sequence() && token != self.end_of_turn =>
            {
                token
            }
            _ => {
                self.cache.push(self.end_of_turn);
                return Ok(self.finish_turn(turn, FinishReason::EndOfSequence));
            }
        };

        if turn.accepted >= self.params.max_new_tokens {
            self.cache.push(self.end_of_turn);
            return Ok(self.finish_turn(turn, FinishReason::TokenBudget));
        }

        self.cache.push(token);
        turn.accepted += 1;
        let text = self.codec.detokenize(&[token])?;
        turn.reply.push_str(&text);

        if let Some(trigger) = self.guard.inspect(&mut turn.reply) {
            // The cache holds whatever the model produced; re-encode the
            // cleaned reply so the cache matches the recorded message.
            self.cache.truncate(turn.rollback_len);
            self.cache.append_message(
                self.codec.as_ref(),
                &Message::assistant(turn.reply.as_str()),
            )?;
            return Ok(self.finish_turn(turn, trigger.into()));
        }

        Ok(Step::Token(text))
    }

    /// Record the reply. The cache must already hold the closed turn.
    fn finish_turn(&mut self, turn: &mut Turn, reason: FinishReason) -> Step {
        self.state = TurnState::Terminated;
        let stats = ReplyStats {
            tokens: turn.accepted,
            elapsed: turn.started.elapsed(),
        };
        self.tracker.record(stats);
        self.messages.push(Message::assistant(turn.reply.as_str()));
        debug!(
            ?reason,
            tokens = stats.tokens,
            tokens_per_second = stats.tokens_per_second(),
            available = self.tokens_available(),
            "reply finished"
        );
        if self.params.debug {
            match serde_json::to_string(&self.messages) {
                Ok(history) => debug!(%history, "history after turn"),
                Err(err) => debug!(%err, "history could not be serialized"),
            }
            match self.transcript() {
                Ok(transcript) => debug!(%transcript, "cache after turn"),
                Err(err) => debug!(%err, "cache could not be rendered"),
            }
        }
        self.state = TurnState::Idle;
        Step::Finished(reason)
    }

    /// Drop the header and any generated tokens. Nothing is recorded.
    pub(crate) fn abort_turn(&mut self, turn: &mut Turn) {
        self.cache.truncate(turn.rollback_len);
        turn.generator = None;
        self.state = TurnState::Idle;
        debug!(
            accepted = turn.accepted,
            used = self.cache.used(),
            "turn rolled back"
        );
    }
}
