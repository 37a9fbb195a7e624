//! chatrelay-bot: conversational relay between a messaging bridge and a
//! chat-completion service.
//!
//! A messaging-platform bridge connects over WebSocket and streams inbound
//! chat messages. Each message runs through the reply pipeline: per-sender
//! history is loaded from an in-memory, TTL-bound session store, sent to the
//! completion service, and the generated reply is relayed back.

mod config;
mod connection;
mod dispatcher;
mod messenger;
mod pipeline;
mod protocol;
mod session;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use chatrelay_ai::{
    AccessTokenProvider, CachedTokenProvider, CompletionClient, Credentials, TokenSource,
};
use clap::Parser;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tracing_subscriber::EnvFilter;

use crate::config::{Args, BotConfig, DEFAULT_LOG_DIRECTIVE};
use crate::connection::handle_connection;
use crate::dispatcher::Dispatcher;
use crate::pipeline::ReplyPipeline;
use crate::session::SessionStore;

/// Load environment variables from `./.env` (KEY=VALUE lines) without
/// overriding anything already set.
fn load_dotenv() {
    let Ok(contents) = std::fs::read_to_string(".env") else {
        return;
    };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file before anything reads the environment
    load_dotenv();

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(args.log_level.as_deref().unwrap_or(DEFAULT_LOG_DIRECTIVE))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("chatrelay-bot v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "chatrelay-bot failed");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> chatrelay_common::Result<()> {
    let config = BotConfig::from_args(&args)?;

    let credentials = Credentials::from_env();
    tracing::info!(
        app_id = %credentials.app_id,
        api_base = %config.completion.api_base,
        model = %config.completion.model,
        "Completion service configured"
    );

    let provider = AccessTokenProvider::new(credentials, config.completion.api_base.clone());
    let tokens: Arc<dyn TokenSource> = if config.cache_token {
        Arc::new(CachedTokenProvider::new(provider))
    } else {
        Arc::new(provider)
    };
    let backend = Arc::new(CompletionClient::new(config.completion.clone(), tokens));

    let store = SessionStore::new();
    // Runs for the lifetime of the process.
    let _sweeper = store.spawn_sweeper(config.sweep_interval);

    let pipeline = ReplyPipeline::new(store, backend)
        .with_policy(config.policy)
        .with_completion_timeout(config.completion_timeout)
        .with_per_key_serialization(config.serialize_per_key);
    let dispatcher = Dispatcher::new(Arc::new(pipeline));

    let listener = TcpListener::bind(config.listen).await?;
    tracing::info!(
        ttl_secs = config.policy.ttl.as_secs(),
        window = config.policy.window,
        serialize_per_key = config.serialize_per_key,
        "chatrelay-bot listening on {}",
        config.listen
    );

    // Accept loop.
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    match accept_async(stream).await {
                        Ok(ws) => handle_connection(ws, addr, dispatcher).await,
                        Err(e) => {
                            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}
