pub mod errors;
pub mod id;

pub use errors::{ChatError, CodecError, ColloquyError, ConfigError};
pub use id::{new_turn_id, SessionId};

pub type Result<T> = std::result::Result<T, ColloquyError>;
