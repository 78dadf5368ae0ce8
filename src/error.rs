//! Typed error hierarchy for the oauth-mtls-client crate.
//!
//! `ApiError` separates the failures a caller can act on:
//! - `Api` wraps an [`ApiFailure`] produced by the classification chain in
//!   [`crate::classify`]. It covers every HTTP response the upstream API
//!   answered with an error status, including the token endpoint.
//! - `Config` covers construction-time problems (bad base URL, unreadable
//!   certificate, malformed TOML) before any request is sent.
//! - `Network` wraps `reqwest::Error` for transport-level failures (DNS,
//!   TCP, TLS handshake, timeouts) that never produced a status code.
//! - `Parse` wraps `serde_json::Error` for JSON documents that could not be
//!   serialized or parsed on the client side.

use std::fmt;

use serde_json::Value;

/// The six error kinds the classification chain can produce.
///
/// Ordering here mirrors rule precedence in [`crate::classify::RULES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Upstream returned 500.
    ServerError,
    /// 400 with `error == "invalid_request"`.
    InvalidRequest,
    /// Upstream returned 404.
    ResourceNotFound,
    /// Upstream returned 401.
    Unauthorized,
    /// 400 without a top-level `error` field.
    BadRequest,
    /// Any other non-2xx status.
    UnknownError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::ServerError => "server error",
            FailureKind::InvalidRequest => "invalid request",
            FailureKind::ResourceNotFound => "resource not found",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::BadRequest => "bad request",
            FailureKind::UnknownError => "unknown error",
        };
        f.write_str(name)
    }
}

/// A classified error response.
///
/// `body` is only populated for `ServerError` and `BadRequest`, where the
/// upstream payload is the only useful diagnostic.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} ({status}): {message}")]
pub struct ApiFailure {
    /// Which rule matched.
    pub kind: FailureKind,
    /// HTTP status code of the response.
    pub status: u16,
    /// Human-readable message extracted from the response.
    pub message: String,
    /// Full parsed response body, when the rule keeps it.
    pub body: Option<Value>,
}

/// Unified error type for all client operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The upstream API answered with a response the classifier rejected.
    #[error(transparent)]
    Api(#[from] ApiFailure),

    /// Invalid or incomplete client configuration.
    #[error("invalid configuration: {message}")]
    Config {
        /// What was wrong with the configuration.
        message: String,
        /// The underlying I/O, TLS, or TOML error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A network-level failure occurred before a status code was received.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A JSON document could not be serialized or parsed.
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// Returns the classified failure kind, or `None` for errors that did
    /// not come from an API response.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            ApiError::Api(failure) => Some(failure.kind),
            _ => None,
        }
    }

    /// Returns the classified failure, if this error came from the API.
    pub fn failure(&self) -> Option<&ApiFailure> {
        match self {
            ApiError::Api(failure) => Some(failure),
            _ => None,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        ApiError::Config {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn config_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ApiError::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, ApiError>;
