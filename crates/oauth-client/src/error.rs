//! Error types for token acquisition

/// Errors from obtaining an access token.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("invalid client credentials: {0}")]
    InvalidCredentials(String),

    #[error("unknown client registration: {0}")]
    UnknownRegistration(String),

    #[error("invalid client registration: {0}")]
    InvalidRegistration(String),
}

/// Result alias for token operations.
pub type Result<T> = std::result::Result<T, Error>;
