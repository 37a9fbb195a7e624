//! Completion client configuration.

use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://cpdd.today";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    pub api_base: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl CompletionConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}
