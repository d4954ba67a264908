use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failure at the tokenizer boundary. The payload is the text (or the
/// rendered token list) that could not be converted.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("tokenization failed for {0:?}")]
    Tokenize(String),

    #[error("detokenization failed for {0}")]
    Detokenize(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("context exceeded: {used} tokens used of {capacity}")]
    ContextOverflow { used: usize, capacity: usize },

    #[error("generation interrupted")]
    Interrupted,
}

impl ChatError {
    /// Codec failures and overflow end the session: the failed turn is
    /// discarded, but retrying would fail the same way.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Codec(_) | Self::ContextOverflow { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ColloquyError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("top_p = 3 is out of range".into());
        assert_eq!(
            err.to_string(),
            "config validation error: top_p = 3 is out of range"
        );
    }

    #[test]
    fn codec_error_display_includes_payload() {
        let err = CodecError::Tokenize("ciao".into());
        assert_eq!(err.to_string(), "tokenization failed for \"ciao\"");

        let err = CodecError::Detokenize("[1, 2, 3]".into());
        assert_eq!(err.to_string(), "detokenization failed for [1, 2, 3]");
    }

    #[test]
    fn chat_error_fatality() {
        let overflow = ChatError::ContextOverflow {
            used: 2049,
            capacity: 2048,
        };
        assert!(overflow.is_fatal());
        assert_eq!(
            overflow.to_string(),
            "context exceeded: 2049 tokens used of 2048"
        );

        let codec: ChatError = CodecError::Tokenize("x".into()).into();
        assert!(codec.is_fatal());

        assert!(!ChatError::Interrupted.is_fatal());
    }

    #[test]
    fn colloquy_error_from_variants() {
        let err: ColloquyError = ConfigError::ParseError("bad toml".into()).into();
        assert!(matches!(err, ColloquyError::Config(_)));
        assert!(err.to_string().contains("bad toml"));

        let err: ColloquyError = ChatError::Interrupted.into();
        assert!(matches!(err, ColloquyError::Chat(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: ColloquyError = io_err.into();
        assert!(matches!(err, ColloquyError::Io(_)));
        assert!(err.to_string().contains("file missing"));

        let err = ColloquyError::Other("something went wrong".into());
        assert_eq!(err.to_string(), "something went wrong");
    }
}
