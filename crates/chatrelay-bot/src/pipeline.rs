//! Reply pipeline: one pass per incoming message.
//!
//! Load the conversation's history, append the user's turn, ask the
//! completion backend, store the (truncated) result, then relay the answer.
//! Completion failures become the reply text; only the user's turn is kept.

use std::sync::Arc;
use std::time::Duration;

use chatrelay_ai::{CompletionBackend, CompletionError, Turn};
use chatrelay_common::{new_correlation_id, ConversationKey, IncomingMessage, RelayError, Scope};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::messenger::Messenger;
use crate::session::{truncate_window, SessionStore, DEFAULT_TTL, DEFAULT_WINDOW};

pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(120);

/// How a message's conversation key is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replier {
    /// Keyed by the direct sender.
    Direct,
    /// Keyed by the member within the group.
    Group,
}

impl Replier {
    pub fn for_scope(scope: Scope) -> Self {
        match scope {
            Scope::Direct => Self::Direct,
            Scope::Group => Self::Group,
        }
    }

    pub fn key(&self, message: &IncomingMessage) -> Result<ConversationKey, ReplyError> {
        match self {
            Self::Direct => Ok(ConversationKey::direct(&message.sender_id)),
            Self::Group => {
                let member = message.group_sender_id.as_deref().ok_or_else(|| {
                    ReplyError::Classify(format!(
                        "group message {} has no group sender",
                        message.id
                    ))
                })?;
                Ok(ConversationKey::group(&message.sender_id, member))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Non-text message; nothing happened.
    Skipped,
    /// The completion succeeded and its text was relayed.
    Answered,
    /// The completion failed and the error text was relayed.
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    #[error("classify error: {0}")]
    Classify(String),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Retention rules applied on every store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub ttl: Duration,
    pub window: usize,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            window: DEFAULT_WINDOW,
        }
    }
}

/// One async mutex per conversation key, created on demand and dropped when
/// no round holds or awaits it.
#[derive(Default)]
struct KeyLocks {
    locks: DashMap<ConversationKey, Arc<Mutex<()>>>,
}

impl KeyLocks {
    async fn acquire(&self, key: &ConversationKey) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(&self.locks.entry(key.clone()).or_default());
        lock.lock_owned().await
    }

    fn release(&self, key: &ConversationKey, guard: OwnedMutexGuard<()>) {
        drop(guard);
        self.locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

pub struct ReplyPipeline {
    store: SessionStore,
    backend: Arc<dyn CompletionBackend>,
    policy: SessionPolicy,
    completion_timeout: Duration,
    key_locks: Option<KeyLocks>,
}

impl ReplyPipeline {
    pub fn new(store: SessionStore, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            store,
            backend,
            policy: SessionPolicy::default(),
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            key_locks: None,
        }
    }

    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    /// Serialize rounds per conversation key. Without this, two overlapping
    /// rounds for the same key both start from the same history and the
    /// later store write discards the earlier round's turns.
    pub fn with_per_key_serialization(mut self, enabled: bool) -> Self {
        self.key_locks = enabled.then(KeyLocks::default);
        self
    }

    #[cfg(test)]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Run one round for `message` and relay the result through `messenger`.
    ///
    /// The store is written before the relay is attempted, so a relay
    /// failure never loses the round's history.
    pub async fn reply(
        &self,
        replier: Replier,
        message: &IncomingMessage,
        messenger: &dyn Messenger,
    ) -> Result<ReplyOutcome, ReplyError> {
        if !message.is_text {
            return Ok(ReplyOutcome::Skipped);
        }
        let key = replier.key(message)?;

        let (text, outcome) = match &self.key_locks {
            Some(locks) => {
                let guard = locks.acquire(&key).await;
                let result = self.round(&key, &message.content).await;
                locks.release(&key, guard);
                result
            }
            None => self.round(&key, &message.content).await,
        };

        messenger.relay(message, &text).await?;
        Ok(outcome)
    }

    /// Load, complete, truncate, store. Returns the text to relay.
    async fn round(&self, key: &ConversationKey, content: &str) -> (String, ReplyOutcome) {
        let round = new_correlation_id();

        let mut turns = self.store.get(key);
        debug!(%round, %key, history = turns.len(), "Loaded session");
        turns.push(Turn::user(content));

        let (text, outcome) = match self.complete(&turns).await {
            Ok(reply) => {
                turns.push(Turn::assistant(reply.clone()));
                (reply, ReplyOutcome::Answered)
            }
            Err(e) => {
                warn!(%round, %key, error = %e, "Completion failed");
                (e.to_string(), ReplyOutcome::Failed)
            }
        };

        truncate_window(&mut turns, self.policy.window);
        debug!(%round, %key, stored = turns.len(), ?outcome, "Storing session");
        self.store.set(key.clone(), turns, self.policy.ttl);

        (text, outcome)
    }

    async fn complete(&self, turns: &[Turn]) -> Result<String, CompletionError> {
        match tokio::time::timeout(self.completion_timeout, self.backend.completion(turns)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Transport(format!(
                "completion timed out after {}s",
                self.completion_timeout.as_secs()
            ))),
        }
    }
}
