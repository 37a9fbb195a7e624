//! Command-line flags and the validated runtime configuration built from them.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use chatrelay_ai::completion::{DEFAULT_API_BASE, DEFAULT_MODEL};
use chatrelay_ai::CompletionConfig;
use chatrelay_common::ConfigError;
use clap::Parser;

use crate::pipeline::SessionPolicy;

pub const DEFAULT_LOG_DIRECTIVE: &str = "chatrelay_bot=info,chatrelay_ai=info";

#[derive(Parser, Debug)]
#[command(
    name = "chatrelay-bot",
    version,
    about = "Relay chat messages from a messaging bridge to a completion service"
)]
pub struct Args {
    /// Address to listen on for bridge connections.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Base URL of the token and completion service.
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Model identifier sent with every completion request.
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sliding session lifetime in seconds.
    #[arg(long, default_value_t = 600)]
    pub session_ttl: u64,

    /// Seconds between sweeps of expired sessions.
    #[arg(long, default_value_t = 60)]
    pub sweep_interval: u64,

    /// Maximum turns kept per conversation.
    #[arg(long, default_value_t = 20)]
    pub window: usize,

    /// Deadline in seconds for a single completion round.
    #[arg(long, default_value_t = 120)]
    pub completion_timeout: u64,

    /// Reuse access tokens until shortly before they expire.
    #[arg(long)]
    pub cache_token: bool,

    /// Serialize reply rounds per conversation.
    #[arg(long)]
    pub serialize_per_key: bool,

    /// Log level override (e.g. "debug", "chatrelay_bot=trace").
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub listen: SocketAddr,
    pub completion: CompletionConfig,
    pub policy: SessionPolicy,
    pub sweep_interval: Duration,
    pub completion_timeout: Duration,
    pub cache_token: bool,
    pub serialize_per_key: bool,
}

impl BotConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let ip: IpAddr = args
            .bind
            .parse()
            .map_err(|e| ConfigError::ParseError(format!("bind address {:?}: {e}", args.bind)))?;

        if args.window == 0 {
            return Err(ConfigError::ValidationError(
                "window must be at least 1".into(),
            ));
        }
        for (name, secs) in [
            ("session-ttl", args.session_ttl),
            ("sweep-interval", args.sweep_interval),
            ("completion-timeout", args.completion_timeout),
        ] {
            if secs == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        if args.api_base.trim().is_empty() {
            return Err(ConfigError::ValidationError("api-base is empty".into()));
        }

        let completion_timeout = Duration::from_secs(args.completion_timeout);
        Ok(Self {
            listen: SocketAddr::new(ip, args.port),
            completion: CompletionConfig::new(args.api_base.clone())
                .with_model(args.model.clone())
                .with_request_timeout(completion_timeout),
            policy: SessionPolicy {
                ttl: Duration::from_secs(args.session_ttl),
                window: args.window,
            },
            sweep_interval: Duration::from_secs(args.sweep_interval),
            completion_timeout,
            cache_token: args.cache_token,
            serialize_per_key: args.serialize_per_key,
        })
    }
}
