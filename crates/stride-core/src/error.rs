//! Error types for the Stride client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified failure categories produced by the HTTP gateway.
///
/// This is a closed taxonomy: every transport- or HTTP-level failure is
/// translated into exactly one of these variants before it reaches the
/// session manager or a domain store. The gateway is the sole translator;
/// nothing outside it inspects raw status codes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The server rejected the request payload (HTTP 400).
    #[error("validation failed")]
    Validation,

    /// Missing or expired credentials (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// The caller is not allowed to perform the operation (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// The requested resource does not exist (HTTP 404).
    #[error("not found")]
    NotFound,

    /// The server throttled the caller (HTTP 429).
    #[error("rate limited")]
    RateLimited,

    /// The server failed (HTTP 500..=599).
    #[error("server error")]
    Server,

    /// The request timed out at the transport level.
    #[error("request timed out")]
    Timeout,

    /// No response was received at all.
    #[error("network unreachable")]
    NetworkUnreachable,

    /// Anything that does not fit the categories above.
    #[error("unknown error")]
    Unknown,
}

impl ErrorKind {
    /// Whether a retry wrapper may attempt the operation again.
    ///
    /// `Unauthorized` and `Validation` are not transient: retrying them
    /// reproduces the same outcome, so they fail fast.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Unauthorized | Self::Validation)
    }

    /// User-presentable message for this failure category.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation => "Please check your input and try again",
            Self::Unauthorized => "Your session has expired, please log in again",
            Self::Forbidden => "You do not have permission to do that",
            Self::NotFound => "The requested resource was not found",
            Self::RateLimited => "Too many requests, please try again later",
            Self::Server => "Server error, please try again later",
            Self::Timeout => "The request timed out, please retry",
            Self::NetworkUnreachable => "Network connection failed, check your network settings",
            Self::Unknown => "Something went wrong, please try again",
        }
    }
}

/// Failures of the persistent key-value store.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// Underlying I/O failure.
    #[error("storage I/O error: {message}")]
    Io { message: String },

    /// A persisted value could not be encoded or decoded.
    #[error("storage serialization error: {message}")]
    Serialization { message: String },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

/// Umbrella error for operations that touch both the network and storage,
/// such as a login that persists its session snapshot.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ErrorKind),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// Returns the API failure category, if this is an API error.
    pub fn api_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Api(kind) => Some(*kind),
            Self::Storage(_) => None,
        }
    }
}

/// A type alias for `Result<T, ClientError>`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_and_validation_are_not_retryable() {
        assert!(!ErrorKind::Unauthorized.is_retryable());
        assert!(!ErrorKind::Validation.is_retryable());
    }

    #[test]
    fn transient_kinds_are_retryable() {
        for kind in [
            ErrorKind::Forbidden,
            ErrorKind::NotFound,
            ErrorKind::RateLimited,
            ErrorKind::Server,
            ErrorKind::Timeout,
            ErrorKind::NetworkUnreachable,
            ErrorKind::Unknown,
        ] {
            assert!(kind.is_retryable(), "{kind} should be retryable");
        }
    }

    #[test]
    fn every_kind_has_a_user_message() {
        assert_eq!(
            ErrorKind::Unauthorized.user_message(),
            "Your session has expired, please log in again"
        );
        for kind in [
            ErrorKind::Validation,
            ErrorKind::Forbidden,
            ErrorKind::NotFound,
            ErrorKind::RateLimited,
            ErrorKind::Server,
            ErrorKind::Timeout,
            ErrorKind::NetworkUnreachable,
            ErrorKind::Unknown,
        ] {
            assert!(!kind.user_message().is_empty());
        }
    }

    #[test]
    fn client_error_exposes_api_kind() {
        let err = ClientError::from(ErrorKind::Server);
        assert_eq!(err.api_kind(), Some(ErrorKind::Server));

        let err = ClientError::from(StorageError::Io {
            message: "disk full".into(),
        });
        assert_eq!(err.api_kind(), None);
    }
}
