//! Application credentials used for the token exchange.

use std::fmt;

pub const APP_ID_ENV: &str = "APP_ID";
pub const APP_SECRET_ENV: &str = "APP_SECRET";

const DEFAULT_APP_ID: &str = "chatrelay-demo";
const DEFAULT_APP_SECRET: &str = "chatrelay-demo-secret";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: String,
    pub app_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }

    /// Read `APP_ID` / `APP_SECRET` from the process environment, falling
    /// back to the demo credentials when either is unset or empty.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str, default: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            app_id: read(APP_ID_ENV, DEFAULT_APP_ID),
            app_secret: read(APP_SECRET_ENV, DEFAULT_APP_SECRET),
        }
    }
}
