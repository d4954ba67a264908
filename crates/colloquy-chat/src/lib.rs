//! Conversation engine for Colloquy.
//!
//! Keeps a chat history and the token cache that mirrors it, and drives a
//! language model behind [`TokenCodec`] one token at a time with:
//! - Whole-reply and streamed generation sharing one turn state machine
//! - Stop rules for end-of-sequence, token budget and context overflow
//! - Guards against escaped terminators and role impersonation
//! - Cooperative interruption between tokens
//! - Reasoning-segment filtering for streamed output

pub mod cache;
pub mod codec;
pub mod echo;
pub mod format;
pub mod guard;
pub mod interrupt;
pub mod message;
pub mod session;
pub mod thinking;
pub mod tracker;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::ContextCache;
pub use codec::{SamplingParams, TokenCodec, TokenId, TokenStream};
pub use echo::EchoCodec;
pub use format::PromptFormat;
pub use guard::{GuardOutcome, GuardTrigger, ReplyGuard};
pub use interrupt::{InterruptChecker, InterruptFlag};
pub use message::{Message, Role};
pub use session::{
    ChatSession, FinishReason, GenerationParams, ReplyStream, SessionStats, StreamEvent,
    TurnState,
};
pub use thinking::{Shown, ThinkFilter, ThinkMarkers};
pub use tracker::{RateTracker, ReplyStats};
