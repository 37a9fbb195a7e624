//! Completion client struct, request building, and response parsing.

use std::sync::Arc;

use crate::{CompletionError, TokenSource, Turn};

use super::config::CompletionConfig;

pub(crate) const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Chat-completion client.
pub struct CompletionClient {
    pub(crate) config: CompletionConfig,
    pub(crate) tokens: Arc<dyn TokenSource>,
    pub(crate) http: reqwest::Client,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig, tokens: Arc<dyn TokenSource>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(config.request_timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            config,
            tokens,
            http,
        }
    }

    pub(crate) fn completions_url(&self) -> String {
        format!(
            "{}{}",
            self.config.api_base.trim_end_matches('/'),
            COMPLETIONS_PATH
        )
    }

    /// Build the JSON request body: the fixed model plus the full history.
    pub(crate) fn build_request_body(&self, history: &[Turn]) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": history,
        })
    }

    /// Extract the generated text from a response body.
    pub(crate) fn parse_response(&self, json: serde_json::Value) -> Result<String, CompletionError> {
        if let Some(message) = json["error"]["message"].as_str() {
            return Err(CompletionError::Protocol(format!("service error: {message}")));
        }

        let choices = json["choices"]
            .as_array()
            .ok_or_else(|| CompletionError::Protocol("no choices in response".to_string()))?;

        let first = choices
            .first()
            .ok_or_else(|| CompletionError::Protocol("empty choices".to_string()))?;

        first["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| CompletionError::Protocol("choice has no message content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AccessToken;
    use async_trait::async_trait;

    struct StaticToken;

    #[async_trait]
    impl TokenSource for StaticToken {
        async fn access_token(&self) -> Result<AccessToken, CompletionError> {
            Ok(AccessToken {
                value: "ak".into(),
                expires_in: std::time::Duration::from_secs(60),
            })
        }
    }

    fn client() -> CompletionClient {
        CompletionClient::new(
            CompletionConfig::new("http://example.test/"),
            Arc::new(StaticToken),
        )
    }

    #[test]
    fn completions_url_joins_base() {
        assert_eq!(
            client().completions_url(),
            "http://example.test/v1/chat/completions"
        );
    }

    #[test]
    fn request_body_keeps_turn_order() {
        let history = vec![
            Turn::user("hello"),
            Turn::assistant("hi there"),
            Turn::user("how are you?"),
        ];
        let body = client().build_request_body(&history);

        assert_eq!(body["model"], "gpt-3.5-turbo");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "hello");
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[2]["content"], "how are you?");
    }

    #[test]
    fn parse_first_choice() {
        let json = serde_json::json!({
            "choices": [
                {"message": {"role": "assistant", "content": "hi there"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        });
        assert_eq!(client().parse_response(json).unwrap(), "hi there");
    }

    #[test]
    fn parse_missing_choices() {
        let err = client().parse_response(serde_json::json!({"id": "x"})).unwrap_err();
        assert!(matches!(err, CompletionError::Protocol(ref m) if m.contains("no choices")));
    }

    #[test]
    fn parse_empty_choices() {
        let err = client()
            .parse_response(serde_json::json!({"choices": []}))
            .unwrap_err();
        assert!(matches!(err, CompletionError::Protocol(ref m) if m == "empty choices"));
    }

    #[test]
    fn parse_choice_without_content() {
        let json = serde_json::json!({"choices": [{"message": {"role": "assistant"}}]});
        assert!(matches!(
            client().parse_response(json),
            Err(CompletionError::Protocol(_))
        ));
    }

    #[test]
    fn parse_service_error_object() {
        let json = serde_json::json!({"error": {"message": "token expired"}});
        let err = client().parse_response(json).unwrap_err();
        assert_eq!(err.to_string(), "protocol error: service error: token expired");
    }
}
