//! Error taxonomy shared by every stage of an invocation.
//!
//! Provider errors carry a [`ProviderCode`] so the pager can tell transient
//! failures (worth another attempt) from permanent ones (propagated as-is).

use std::fmt;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a Pub/Sub API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCode {
    /// 429 / `RESOURCE_EXHAUSTED`.
    RateLimited,
    /// 503 / `UNAVAILABLE`, or the connection could not be established.
    Unavailable,
    /// 504 / `DEADLINE_EXCEEDED`, or the request timed out locally.
    DeadlineExceeded,
    /// 500 / `INTERNAL`.
    Internal,
    NotFound,
    PermissionDenied,
    InvalidArgument,
    Unauthenticated,
    /// Anything else, keyed by HTTP status.
    Other(u16),
}

impl ProviderCode {
    /// Maps a Google API error `status` string (e.g. `"NOT_FOUND"`).
    pub fn from_status_name(name: &str) -> Option<Self> {
        let code = match name {
            "RESOURCE_EXHAUSTED" => Self::RateLimited,
            "UNAVAILABLE" => Self::Unavailable,
            "DEADLINE_EXCEEDED" => Self::DeadlineExceeded,
            "INTERNAL" => Self::Internal,
            "NOT_FOUND" => Self::NotFound,
            "PERMISSION_DENIED" => Self::PermissionDenied,
            "INVALID_ARGUMENT" => Self::InvalidArgument,
            "UNAUTHENTICATED" => Self::Unauthenticated,
            _ => return None,
        };
        Some(code)
    }

    /// Fallback mapping when the error body carries no usable status name.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            503 => Self::Unavailable,
            504 => Self::DeadlineExceeded,
            500 => Self::Internal,
            404 => Self::NotFound,
            403 => Self::PermissionDenied,
            400 => Self::InvalidArgument,
            401 => Self::Unauthenticated,
            other => Self::Other(other),
        }
    }

    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Unavailable | Self::DeadlineExceeded | Self::Internal
        )
    }
}

impl fmt::Display for ProviderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => f.write_str("rate limited"),
            Self::Unavailable => f.write_str("unavailable"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
            Self::Internal => f.write_str("internal"),
            Self::NotFound => f.write_str("not found"),
            Self::PermissionDenied => f.write_str("permission denied"),
            Self::InvalidArgument => f.write_str("invalid argument"),
            Self::Unauthenticated => f.write_str("unauthenticated"),
            Self::Other(status) => write!(f, "http {status}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A Pub/Sub listing call failed.
    #[error("pubsub error ({code}): {message}")]
    PubSub { code: ProviderCode, message: String },

    /// Reading or writing the snapshot object failed.
    #[error("object storage error: {0}")]
    Storage(#[from] object_store::Error),

    /// The snapshot or report could not be (de)serialized.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// Credentials for the provider could not be obtained.
    #[error("authentication error: {0}")]
    Auth(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn pubsub(code: ProviderCode, message: impl Into<String>) -> Self {
        Self::PubSub {
            code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for provider errors that a retry may resolve.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::PubSub { code, .. } => code.is_transient(),
            _ => false,
        }
    }

    /// Returns `true` when the object store reported a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(object_store::Error::NotFound { .. }))
    }
}
