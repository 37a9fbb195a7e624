//! Expiry-aware token reuse on top of any `TokenSource`.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::{CompletionError, TokenSource};

use super::provider::AccessToken;

const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(30);

struct CachedToken {
    token: AccessToken,
    refresh_at: Instant,
}

/// Reuses a token until `expires_in - refresh_margin` has elapsed.
///
/// Tokens whose declared lifetime does not exceed the margin are handed out
/// once and never cached. Failed fetches leave the cache empty.
pub struct CachedTokenProvider<S> {
    inner: S,
    refresh_margin: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl<S: TokenSource> CachedTokenProvider<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            refresh_margin: DEFAULT_REFRESH_MARGIN,
            cached: Mutex::new(None),
        }
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }
}

#[async_trait]
impl<S: TokenSource> TokenSource for CachedTokenProvider<S> {
    async fn access_token(&self) -> Result<AccessToken, CompletionError> {
        // Held across the fetch so concurrent callers share one refresh.
        let mut slot = self.cached.lock().await;

        if let Some(cached) = slot.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.token.clone());
            }
        }

        *slot = None;
        let token = self.inner.access_token().await?;

        *slot = token
            .expires_in
            .checked_sub(self.refresh_margin)
            .filter(|lifetime| !lifetime.is_zero())
            .map(|lifetime| CachedToken {
                token: token.clone(),
                refresh_at: Instant::now() + lifetime,
            });

        debug!(cached = slot.is_some(), "Access token refreshed");
        Ok(token)
    }
}
