//! Error taxonomy for beer service calls

use transport::StatusCode;

/// Errors surfaced by `BeerClient`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No access token could be obtained; nothing was sent.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The server answered 404 for the addressed beer.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request could not be delivered, or the server answered with an
    /// unexpected status. `status` is `None` when no response was received.
    #[error("transport error: {message}")]
    Transport {
        status: Option<StatusCode>,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The call was rejected locally before any request was sent.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Result alias for beer service calls.
pub type Result<T> = std::result::Result<T, Error>;

/// What a caller can reasonably do about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClassification {
    /// Transient: the same call may succeed later.
    Retry,
    /// The resource does not exist.
    Absent,
    /// Retrying will not help.
    Abort,
}

impl Error {
    pub(crate) fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Error::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn classification(&self) -> ErrorClassification {
        match self {
            Error::Auth(_) => ErrorClassification::Retry,
            Error::NotFound(_) => ErrorClassification::Absent,
            Error::Transport { status: None, .. } => ErrorClassification::Retry,
            Error::Transport {
                status: Some(status),
                ..
            } if *status == StatusCode::REQUEST_TIMEOUT
                || *status == StatusCode::TOO_MANY_REQUESTS
                || status.is_server_error() =>
            {
                ErrorClassification::Retry
            }
            Error::Transport { .. } | Error::Decode(_) | Error::Validation(_) => {
                ErrorClassification::Abort
            }
        }
    }

    /// Short label used for the `outcome` metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Auth(_) => "auth",
            Error::NotFound(_) => "not_found",
            Error::Transport { .. } => "transport",
            Error::Decode(_) => "decode",
            Error::Validation(_) => "validation",
        }
    }

    /// HTTP status of the response that caused the error, if any.
    pub fn http_status(&self) -> Option<StatusCode> {
        match self {
            Error::Transport { status, .. } => *status,
            Error::NotFound(_) => Some(StatusCode::NOT_FOUND),
            _ => None,
        }
    }
}

impl From<transport::Error> for Error {
    fn from(err: transport::Error) -> Self {
        match err {
            transport::Error::Auth(msg) => Error::Auth(msg),
            transport::Error::Network(msg) => Error::Transport {
                status: None,
                message: msg,
            },
            transport::Error::InvalidRequest(msg) => Error::Validation(msg),
        }
    }
}
