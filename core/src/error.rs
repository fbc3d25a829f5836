//! Error types for the STRAT API client.
//!
//! # Design
//! Three kinds, matched explicitly by callers. `Network` means the request
//! never got a timely answer, `Api` means the node answered with a
//! non-2xx status, and `Generic` covers everything else: local validation,
//! malformed responses and unexpected transport failures.

use thiserror::Error;

/// Errors returned by every `StratClient` operation.
#[derive(Debug, Error)]
pub enum StratError {
    /// Timeout or connection failure. The node never answered.
    #[error("network error: {message}")]
    Network { message: String },

    /// The node answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Anything not classified above.
    #[error("unexpected error: {0}")]
    Generic(String),
}

/// Coarse discriminant of a `StratError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Api,
    Generic,
}

impl StratError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StratError::Network { .. } => ErrorKind::Network,
            StratError::Api { .. } => ErrorKind::Api,
            StratError::Generic(_) => ErrorKind::Generic,
        }
    }

    /// HTTP status of an `Api` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            StratError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type StratResult<T> = Result<T, StratError>;
