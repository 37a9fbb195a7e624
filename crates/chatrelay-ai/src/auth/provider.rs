//! Credential exchange against the auth endpoint.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{CompletionError, TokenSource};

use super::credentials::Credentials;

pub(crate) const AUTH_PATH: &str = "/auth/ak";

/// A bearer token and the lifetime the service declared for it.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_in: Duration,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expire_in: u64,
}

/// Exchanges application credentials for a fresh token on every call.
pub struct AccessTokenProvider {
    credentials: Credentials,
    api_base: String,
    http: reqwest::Client,
}

impl AccessTokenProvider {
    pub fn new(credentials: Credentials, api_base: impl Into<String>) -> Self {
        Self {
            credentials,
            api_base: api_base.into(),
            http: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    pub(crate) fn auth_url(&self) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), AUTH_PATH)
    }
}

#[async_trait]
impl TokenSource for AccessTokenProvider {
    async fn access_token(&self) -> Result<AccessToken, CompletionError> {
        debug!(app_id = %self.credentials.app_id, "Requesting access token");

        let response = self
            .http
            .get(self.auth_url())
            .query(&[
                ("app_id", self.credentials.app_id.as_str()),
                ("app_secret", self.credentials.app_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CompletionError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(200).collect::<String>();
            return Err(CompletionError::Auth(format!("HTTP {status}: {text}")));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Auth(format!("undecodable token response: {e}")))?;

        if body.access_token.is_empty() {
            return Err(CompletionError::Auth(
                "token response carried an empty access_token".into(),
            ));
        }

        Ok(AccessToken {
            value: body.access_token,
            expires_in: Duration::from_secs(body.expire_in),
        })
    }
}
