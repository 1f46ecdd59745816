//! Remote API error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by a remote release source.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// API error from the platform.
    #[error("API error: {message}")]
    Api { message: String },

    /// Network or connection error.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The repository no longer exists or is inaccessible. Callers skip it
    /// and keep any stored history.
    #[error("Repository gone: {repository}")]
    Gone { repository: String },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded. Resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    /// Authentication required or failed.
    #[error("Authentication required")]
    AuthRequired,
}

impl RemoteError {
    /// Create an API error.
    #[inline]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a network error.
    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a repository-gone error.
    #[inline]
    pub fn gone(repository: impl Into<String>) -> Self {
        Self::Gone {
            repository: repository.into(),
        }
    }

    /// Check if this error means the repository is gone (skip, don't abort).
    #[inline]
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone { .. })
    }

    /// Check if this error is a rate limit error (retryable).
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Result type for remote operations.
pub type Result<T> = std::result::Result<T, RemoteError>;
