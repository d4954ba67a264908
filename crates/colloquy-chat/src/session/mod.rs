//! Conversation session: history, token cache and reply generation.
//!
//! A `ChatSession` records turns, keeps the token cache in step with the
//! history and drives the model one token at a time, either collecting the
//! whole reply (`generate_reply`) or handing each fragment to the caller as
//! it is produced (`generate_reply_stepped`).

mod manager;
mod params;
mod reply;
mod stream;
mod turn;


pub use manager::{ChatSession, SessionStats};
pub use params::GenerationParams;
pub use stream::{ReplyStream, StreamEvent};
pub use turn::{FinishReason, TurnState};
