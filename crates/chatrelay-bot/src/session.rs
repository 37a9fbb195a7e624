//! Session store: maps conversation keys to bounded, expiring turn histories.

use std::sync::Arc;
use std::time::Duration;

use chatrelay_ai::Turn;
use chatrelay_common::ConversationKey;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_WINDOW: usize = 20;

/// History for one conversation plus its expiry deadline.
struct Session {
    turns: Vec<Turn>,
    expires_at: Instant,
}

impl Session {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe session store.
///
/// Backed by a sharded map so that readers and writers of different keys do
/// not contend. Cloning yields another handle to the same store.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<ConversationKey, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current history for `key`, or empty if absent or expired.
    pub fn get(&self, key: &ConversationKey) -> Vec<Turn> {
        let now = Instant::now();
        if let Some(session) = self.sessions.get(key) {
            if !session.is_expired(now) {
                return session.turns.clone();
            }
        }
        // Re-checked under the shard lock so a concurrent rewrite survives.
        self.sessions.remove_if(key, |_, session| session.is_expired(now));
        Vec::new()
    }

    /// Replace the history for `key` and push its deadline to `now + ttl`.
    pub fn set(&self, key: ConversationKey, turns: Vec<Turn>, ttl: Duration) {
        let session = Session {
            turns,
            expires_at: Instant::now() + ttl,
        };
        self.sessions.insert(key, session);
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        // Entries rewritten after `now` carry a later deadline and survive.
        let now = Instant::now();
        let mut purged = 0;
        self.sessions.retain(|_, session| {
            let expired = session.is_expired(now);
            if expired {
                purged += 1;
            }
            !expired
        });
        purged
    }

    /// Number of stored sessions, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Spawn a background task purging expired sessions every `interval`.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = store.purge_expired();
                tracing::debug!(purged, sessions = store.len(), "Sweeper tick");
            }
        })
    }
}

/// Drop the oldest turns until at most `window` remain.
pub fn truncate_window(turns: &mut Vec<Turn>, window: usize) {
    if turns.len() > window {
        let excess = turns.len() - window;
        turns.drain(..excess);
    }
}
