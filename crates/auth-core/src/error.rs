//! Error types for the token lifecycle engine.

use thiserror::Error;

/// The five ways a token-lifecycle operation can fail. Handlers in
/// `auth-api` map each variant onto an HTTP status without needing to know
/// anything about stores, buffers, or JWTs.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No refresh token matches the requested account or handle.
    #[error("refresh token not found")]
    NotFound,

    /// The request is authenticated but fails a policy check: a stale or
    /// mismatched anti-replay field, a revoked token presented again, or an
    /// access token that doesn't belong to the caller.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A JWT (or other caller-supplied token material) is malformed,
    /// unparsable, or signed under a disallowed algorithm.
    #[error("parse error: {0}")]
    ParseError(String),

    /// The durable store or one of the write-behind buffers failed.
    #[error("storage error: {0}")]
    StorageError(String),

    /// The operation was cancelled by shutdown before it could complete.
    #[error("operation cancelled")]
    Cancelled,
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::StorageError(err.to_string())
    }
}

impl From<auth_crypto::JwtError> for AuthError {
    fn from(err: auth_crypto::JwtError) -> Self {
        AuthError::ParseError(err.to_string())
    }
}
