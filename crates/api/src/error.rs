//! Errors raised while talking to the diff service.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("diff request could not be sent: {0}")]
    Transport(#[source] reqwest::Error),

    /// The service answered outside the 2xx range.
    #[error("diff request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// A 2xx body without a string at `data.link`.
    #[error("diff response is missing data.link: {body}")]
    MalformedResponse { body: String },
}

impl DiffError {
    /// HTTP status for `Status` errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
