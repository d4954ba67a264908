//! Whole-reply generation.

use colloquy_common::ChatError;
use tracing::info;

use super::manager::ChatSession;
use super::stream::ReplyStream;
use super::turn::{FinishReason, Step};

impl ChatSession {
    /// Generate and record a complete assistant reply.
    ///
    /// Returns the cleaned reply and the remaining token budget. An
    /// interrupted turn is rolled back and reported as
    /// [`ChatError::Interrupted`]; overflow and codec failures are fatal for
    /// the session.
    pub fn generate_reply(&mut self) -> Result<(String, i64), ChatError> {
        let mut turn = self.begin_turn()?;
        loop {
            match self.step(&mut turn)? {
                Step::Token(_) => continue,
                Step::Finished(FinishReason::Interrupted) => {
                    info!(session = %self.id, "reply interrupted");
                    return Err(ChatError::Interrupted);
                }
                Step::Finished(_) => {
                    return Ok((turn.reply, self.tokens_available()));
                }
            }
        }
    }

    /// Generate a reply one fragment at a time. See [`ReplyStream`].
    pub fn generate_reply_stepped(&mut self) -> ReplyStream<'_> {
        ReplyStream::new(self)
    }
}
