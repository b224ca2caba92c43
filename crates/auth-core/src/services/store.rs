//! Durable CRUD over refresh-token rows.

use crate::error::AuthError;
use crate::models::RefreshToken;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Durable storage for refresh tokens. Implementations are expected to be
/// concurrency-safe (delegated to the underlying connection pool) and to
/// hold no in-memory state of their own.
#[async_trait]
pub trait Store: Send + Sync {
    /// All rows for `account`, ordered by `created_at` ascending — the
    /// oldest token is index 0. This ordering is load-bearing for quota
    /// eviction in [`crate::services::TokenService`]; do not change it
    /// without updating the eviction logic in lockstep.
    async fn find_by_account(&self, account: Uuid) -> Result<Vec<RefreshToken>, AuthError>;

    /// The single row for `handle`, or [`AuthError::NotFound`].
    async fn find_by_handle(&self, handle: Uuid) -> Result<RefreshToken, AuthError>;

    /// Bulk insert. Sets `created_at` on each record to the current UTC
    /// instant as a side effect. A no-op on an empty slice must still
    /// succeed without issuing a query.
    async fn insert(&self, tokens: &mut [RefreshToken]) -> Result<(), AuthError>;

    /// Bulk delete by handle. A no-op on an empty slice must not issue a
    /// query.
    async fn delete_by_handles(&self, handles: &[Uuid]) -> Result<(), AuthError>;

    /// Delete every row whose `expires_in` is at or before `cutoff`.
    async fn delete_by_expiry(&self, cutoff: DateTime<Utc>) -> Result<(), AuthError>;
}
