use std::sync::Arc;

use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Failure of a request whose result was shared between coalesced callers.
    #[error(transparent)]
    Shared(Arc<Error>),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the request never produced a usable JSON answer: the
    /// transport failed, the body was not JSON, or the status was not 2xx.
    pub fn is_network_failure(&self) -> bool {
        match self {
            Error::Reqwest(_) | Error::Json(_) | Error::Status { .. } => true,
            Error::Shared(inner) => inner.is_network_failure(),
            _ => false,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Reqwest(err) => err.status(),
            Error::Shared(inner) => inner.status(),
            _ => None,
        }
    }
}

impl From<Arc<Error>> for Error {
    fn from(err: Arc<Error>) -> Self {
        Error::Shared(err)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("background task failed: {}", err))
    }
}
