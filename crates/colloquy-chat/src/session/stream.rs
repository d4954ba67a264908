//! Incremental reply delivery.

use std::collections::VecDeque;

use colloquy_common::ChatError;

use super::manager::ChatSession;
use super::turn::{FinishReason, Step, Turn};

/// One item of a streamed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Text of one accepted token.
    Token(String),
    /// Erase the last `columns` characters already shown; the model spelled
    /// out the end-of-turn marker and those characters were part of it.
    Retract { columns: usize },
    /// Discard the current line; the model started another role's turn.
    ClearLine,
    /// The turn is over and, unless interrupted, recorded.
    Finished(FinishReason),
}

impl StreamEvent {
    /// Terminal rendering: backspaces over blanks for a retraction, an ANSI
    /// erase-line for a cleared line, a newline when the reply ends.
    pub fn to_terminal(&self) -> String {
        match self {
            Self::Token(text) => text.clone(),
            Self::Retract { columns } => {
                format!("{}{}", "\x08".repeat(*columns), " ".repeat(*columns))
            }
            Self::ClearLine => "\x1b[2K\r".to_string(),
            Self::Finished(FinishReason::Impersonation(_)) => String::new(),
            Self::Finished(_) => "\n".to_string(),
        }
    }
}

enum StreamState {
    NotStarted,
    Running(Turn),
    Done,
}

/// Lazily generated reply. The turn starts on the first `next()`.
///
/// Dropping the stream before it yields `Finished` rolls the turn back: the
/// cache returns to its length before the header and no message is
/// recorded.
pub struct ReplyStream<'s> {
    session: &'s mut ChatSession,
    state: StreamState,
    pending: VecDeque<StreamEvent>,
}

impl<'s> ReplyStream<'s> {
    pub(super) fn new(session: &'s mut ChatSession) -> Self {
        Self {
            session,
            state: StreamState::NotStarted,
            pending: VecDeque::new(),
        }
    }

    /// Events that finish the turn for `reason`.
    fn closing_events(&self, reason: FinishReason) -> Vec<StreamEvent> {
        match reason {
            FinishReason::EscapedTerminator => {
                let columns = self
                    .session
                    .guard
                    .end_of_turn()
                    .chars()
                    .count()
                    .saturating_sub(1);
                vec![
                    StreamEvent::Retract { columns },
                    StreamEvent::Finished(reason),
                ]
            }
            FinishReason::Impersonation(_) => {
                vec![StreamEvent::ClearLine, StreamEvent::Finished(reason)]
            }
            _ => vec![StreamEvent::Finished(reason)],
        }
    }
}

impl Iterator for ReplyStream<'_> {
    type Item = Result<StreamEvent, ChatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.pending.pop_front() {
            return Some(Ok(event));
        }

        if let StreamState::NotStarted = self.state {
            match self.session.begin_turn() {
                Ok(turn) => self.state = StreamState::Running(turn),
                Err(err) => {
                    self.state = StreamState::Done;
                    return Some(Err(err));
                }
            }
        }

        let StreamState::Running(turn) = &mut self.state else {
            return None;
        };

        match self.session.step(turn) {
            Ok(Step::Token(text)) => Some(Ok(StreamEvent::Token(text))),
            Ok(Step::Finished(reason)) => {
                self.state = StreamState::Done;
                let events = self.closing_events(reason);
                self.pending.extend(events);
                self.pending.pop_front().map(Ok)
            }
            Err(err) => {
                self.state = StreamState::Done;
                Some(Err(err))
            }
        }
    }
}

impl Drop for ReplyStream<'_> {
    fn drop(&mut self) {
        if let StreamState::Running(mut turn) =
            std::mem::replace(&mut self.state, StreamState::Done)
        {
            self.session.abort_turn(&mut turn);
        }
    }
}
