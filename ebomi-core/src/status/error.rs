use thiserror::Error;

use super::models::LiveProvider;

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("status endpoint answered {status}")]
    HttpStatus { status: u16 },
    #[error("malformed status body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid status endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("{provider} check failed: {reason}")]
    Provider {
        provider: LiveProvider,
        reason: String,
    },
}

pub type StatusResult<T> = std::result::Result<T, StatusError>;
