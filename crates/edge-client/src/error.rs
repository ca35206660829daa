//! Errors raised while constructing a client.
//!
//! Request-time failures never surface here; they are reported through
//! [`SafeResult`](crate::SafeResult).

/// Construction and configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to load client configuration: {0}")]
    Config(#[from] figment::Error),

    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
