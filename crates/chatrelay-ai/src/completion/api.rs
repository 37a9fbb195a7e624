//! CompletionBackend implementation for CompletionClient.

use async_trait::async_trait;
use tracing::debug;

use crate::{CompletionBackend, CompletionError, Turn};

use super::client::CompletionClient;

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn completion(&self, history: &[Turn]) -> Result<String, CompletionError> {
        let token = self.tokens.access_token().await?;
        let body = self.build_request_body(history);

        debug!(model = %self.config.model, turns = history.len(), "Completion request");

        let response = self
            .http
            .post(self.completions_url())
            .query(&[("access_token", token.value.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(200).collect::<String>();
            return Err(CompletionError::Protocol(format!("HTTP {status}: {text}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CompletionError::Protocol(e.to_string()))?;

        self.parse_response(json)
    }
}
