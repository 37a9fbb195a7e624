#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failure to hand a reply back to the conversation it came from.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay channel closed")]
    ChannelClosed,

    #[error("relay transport error: {0}")]
    Transport(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ChatRelayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
