//! Chat-completion client.
//!
//! Implements `CompletionBackend` against an OpenAI-compatible
//! `/v1/chat/completions` endpoint. The access token travels as the
//! `access_token` query parameter rather than a header.

mod api;
mod client;
mod config;

pub use client::CompletionClient;
pub use config::{CompletionConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
