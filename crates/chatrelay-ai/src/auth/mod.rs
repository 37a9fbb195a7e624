//! Access-token acquisition.
//!
//! Every completion request carries a short-lived bearer token obtained by
//! exchanging the application id and secret at the service's auth endpoint.
//! `AccessTokenProvider` performs one exchange per call; `CachedTokenProvider`
//! wraps any `TokenSource` and reuses a token until shortly before it expires.

mod cache;
mod credentials;
mod provider;

pub use cache::CachedTokenProvider;
pub use credentials::{Credentials, APP_ID_ENV, APP_SECRET_ENV};
pub use provider::{AccessToken, AccessTokenProvider};
