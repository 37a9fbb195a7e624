//! Completion backend for chatrelay.
//!
//! Provides:
//! - Access-token exchange against the service's auth endpoint
//! - Optional expiry-aware token caching
//! - A chat-completion client that sends the ordered turn history

pub mod auth;
pub mod completion;

use async_trait::async_trait;

pub use auth::{AccessToken, AccessTokenProvider, CachedTokenProvider, Credentials};
pub use completion::{CompletionClient, CompletionConfig};

/// Anything that can turn an ordered conversation into the next reply.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn completion(&self, history: &[Turn]) -> Result<String, CompletionError>;
}

/// Anything that can hand out a bearer token for completion requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken, CompletionError>;
}

/// One utterance in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("auth error: {0}")]
    Auth(String),
    #[error("network error: {0}")]
    Transport(String),
    #[error("protocol error: {0}")]
    Protocol(String),
}
