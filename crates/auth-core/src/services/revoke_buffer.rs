//! In-memory queue of handles awaiting deletion, drained into the
//! underlying store with at-least-once delivery.

use crate::error::AuthError;
use crate::services::store::Store;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{error, instrument};
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 64;

pub struct RevokeBuffer {
    inner: Arc<dyn Store>,
    pending: Mutex<HashSet<Uuid>>,
}

impl RevokeBuffer {
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self {
            inner,
            pending: Mutex::new(HashSet::with_capacity(DEFAULT_CAPACITY)),
        }
    }

    /// Append `handles` to the pending set. Never fails; the mutex is held
    /// only long enough to insert, never across I/O.
    pub fn enqueue(&self, handles: impl IntoIterator<Item = Uuid>) {
        let mut pending = self.pending.lock().unwrap();
        pending.extend(handles);
    }

    /// Expiry sweeps are idempotent and need no coalescing, so this passes
    /// straight through to the underlying store.
    pub async fn delete_by_expiry(&self, cutoff: DateTime<Utc>) -> Result<(), AuthError> {
        self.inner.delete_by_expiry(cutoff).await
    }

    /// Snapshot the pending set and install a fresh empty one before
    /// releasing the lock, so callers of `enqueue` never block on the
    /// delete itself. On failure, the snapshot is re-enqueued (guaranteeing
    /// at-least-once revocation) and the failure is still reported.
    #[instrument(skip(self))]
    pub async fn drain(&self) -> Result<(), AuthError> {
        let snapshot: Vec<Uuid> = {
            let mut pending = self.pending.lock().unwrap();
            if pending.is_empty() {
                return Ok(());
            }
            std::mem::replace(&mut *pending, HashSet::with_capacity(DEFAULT_CAPACITY))
                .into_iter()
                .collect()
        };

        if let Err(delete_err) = self.inner.delete_by_handles(&snapshot).await {
            error!(error = %delete_err, count = snapshot.len(), "revoke buffer drain failed, re-enqueueing");
            self.enqueue(snapshot);
            return Err(delete_err);
        }

        Ok(())
    }
}

#[async_trait]
impl super::Drain for RevokeBuffer {
    async fn drain(&self) -> Result<(), AuthError> {
        RevokeBuffer::drain(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RefreshToken;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FlakyStore {
        deleted: StdMutex<Vec<Uuid>>,
        attempts: AtomicUsize,
        fail_first_n: usize,
    }

    #[async_trait]
    impl Store for FlakyStore {
        async fn find_by_account(&self, _account: Uuid) -> Result<Vec<RefreshToken>, AuthError> {
            Err(AuthError::NotFound)
        }

        async fn find_by_handle(&self, _handle: Uuid) -> Result<RefreshToken, AuthError> {
            Err(AuthError::NotFound)
        }

        async fn insert(&self, _tokens: &mut [RefreshToken]) -> Result<(), AuthError> {
            Ok(())
        }

        async fn delete_by_handles(&self, handles: &[Uuid]) -> Result<(), AuthError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_first_n {
                return Err(AuthError::StorageError("transient".into()));
            }
            self.deleted.lock().unwrap().extend(handles.iter().copied());
            Ok(())
        }

        async fn delete_by_expiry(&self, _cutoff: DateTime<Utc>) -> Result<(), AuthError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn drain_on_empty_buffer_issues_no_store_call() {
        let store = Arc::new(FlakyStore::default());
        let buffer = RevokeBuffer::new(store.clone());

        buffer.drain().await.unwrap();
        assert_eq!(store.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_drain_reenqueues_the_snapshot() {
        let store = Arc::new(FlakyStore {
            fail_first_n: 1,
            ..Default::default()
        });
        let buffer = RevokeBuffer::new(store.clone());
        let h1 = Uuid::new_v4();
        let h2 = Uuid::new_v4();
        buffer.enqueue([h1, h2]);

        assert!(buffer.drain().await.is_err());
        assert!(store.deleted.lock().unwrap().is_empty());

        buffer.drain().await.unwrap();
        let deleted = store.deleted.lock().unwrap();
        assert_eq!(deleted.len(), 2);
        assert!(deleted.contains(&h1) && deleted.contains(&h2));
    }

    #[tokio::test]
    async fn enqueue_is_idempotent_under_duplicate_handles() {
        let store = Arc::new(FlakyStore::default());
        let buffer = RevokeBuffer::new(store.clone());
        let h1 = Uuid::new_v4();
        buffer.enqueue([h1]);
        buffer.enqueue([h1]);

        buffer.drain().await.unwrap();
        assert_eq!(store.deleted.lock().unwrap().len(), 1);
    }
}
