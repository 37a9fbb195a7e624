pub mod errors;
pub mod events;
pub mod id;

pub use errors::{ChatRelayError, ConfigError, RelayError};
pub use events::{IncomingMessage, Scope};
pub use id::{new_correlation_id, new_id, ConversationKey};

pub type Result<T> = std::result::Result<T, ChatRelayError>;
