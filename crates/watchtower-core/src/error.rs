//! Shared error type across watchtower crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / missing parameter.
    BadRequest,
    /// Unknown route or resource.
    NotFound,
    /// Temporarily unable to serve (e.g. connection cap reached).
    Unavailable,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Unavailable => "UNAVAILABLE",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, WatchtowerError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum WatchtowerError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl WatchtowerError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            WatchtowerError::BadRequest(_) => ClientCode::BadRequest,
            WatchtowerError::NotFound(_) => ClientCode::NotFound,
            WatchtowerError::Unavailable(_) => ClientCode::Unavailable,
            WatchtowerError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            WatchtowerError::Internal(_) => ClientCode::Internal,
        }
    }
}
