//! Error types for the feed client

use hazard_core::FetchError;
use thiserror::Error;

/// Errors building a [`FeedClient`](crate::FeedClient).
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("invalid feed configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Classify a transport-level reqwest failure.
pub fn classify(err: reqwest::Error, timeout_seconds: u64) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            seconds: timeout_seconds,
        }
    } else if err.is_decode() {
        FetchError::Parse(err.to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}

/// Map a non-success HTTP status. 401 and 403 mean the key was refused.
pub fn from_status(status: reqwest::StatusCode) -> FetchError {
    match status.as_u16() {
        401 | 403 => FetchError::Auth {
            status: status.as_u16(),
        },
        code => FetchError::Network(format!("unexpected HTTP status {code}")),
    }
}
