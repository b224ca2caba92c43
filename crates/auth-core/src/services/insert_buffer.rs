//! Write-behind buffer for new tokens, with read-through for rows not yet
//! flushed to the underlying store.

use crate::error::AuthError;
use crate::models::RefreshToken;
use crate::services::store::Store;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, instrument};
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 64;

struct Pending {
    sequence: Vec<RefreshToken>,
    by_account: HashMap<Uuid, Vec<RefreshToken>>,
    by_handle: HashMap<Uuid, RefreshToken>,
}

impl Pending {
    fn with_capacity(cap: usize) -> Self {
        Self {
            sequence: Vec::with_capacity(cap),
            by_account: HashMap::with_capacity(cap),
            by_handle: HashMap::with_capacity(cap),
        }
    }
}

/// In-memory staging area for newly created tokens. Not a cache: a miss
/// against both the underlying store and the pending index means the
/// handle does not exist, full stop.
pub struct InsertBuffer {
    inner: Arc<dyn Store>,
    pending: RwLock<Pending>,
}

impl InsertBuffer {
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self {
            inner,
            pending: RwLock::new(Pending::with_capacity(DEFAULT_CAPACITY)),
        }
    }

    /// Append `tokens` to the pending sequence and both secondary indexes.
    /// Purely in-memory — never fails, returns immediately.
    pub async fn insert(&self, tokens: &[RefreshToken]) {
        if tokens.is_empty() {
            return;
        }
        let mut pending = self.pending.write().await;
        for token in tokens {
            pending.sequence.push(token.clone());
            pending
                .by_account
                .entry(token.account)
                .or_default()
                .push(token.clone());
            pending.by_handle.insert(token.handle, token.clone());
        }
    }

    pub async fn find_by_account(&self, account: Uuid) -> Result<Vec<RefreshToken>, AuthError> {
        let mut durable = match self.inner.find_by_account(account).await {
            Ok(rows) => rows,
            Err(AuthError::NotFound) => Vec::new(),
            Err(e) => return Err(e),
        };

        let pending = self.pending.read().await;
        if let Some(queued) = pending.by_account.get(&account) {
            durable.extend(queued.iter().cloned());
        }

        if durable.is_empty() {
            Err(AuthError::NotFound)
        } else {
            Ok(durable)
        }
    }

    pub async fn find_by_handle(&self, handle: Uuid) -> Result<RefreshToken, AuthError> {
        match self.inner.find_by_handle(handle).await {
            Ok(token) => Ok(token),
            Err(AuthError::NotFound) => {
                let pending = self.pending.read().await;
                pending
                    .by_handle
                    .get(&handle)
                    .cloned()
                    .ok_or(AuthError::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    /// Flush the pending sequence into the underlying store. Holds the
    /// writer lock for the full duration of the underlying call, which is
    /// a deliberate blocking checkpoint against concurrent inserts and
    /// reads.
    #[instrument(skip(self))]
    pub async fn drain(&self) -> Result<(), AuthError> {
        let mut pending = self.pending.write().await;
        if pending.sequence.is_empty() {
            return Ok(());
        }

        match self.inner.insert(&mut pending.sequence).await {
            Ok(()) => {
                *pending = Pending::with_capacity(DEFAULT_CAPACITY);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "insert buffer drain failed, retaining pending tokens");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl super::Drain for InsertBuffer {
    async fn drain(&self) -> Result<(), AuthError> {
        InsertBuffer::drain(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::Store;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeStore {
        rows: StdMutex<Vec<RefreshToken>>,
        fail_insert: StdMutex<bool>,
    }

    #[async_trait]
    impl Store for FakeStore {
        async fn find_by_account(&self, account: Uuid) -> Result<Vec<RefreshToken>, AuthError> {
            let rows: Vec<_> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.account == account)
                .cloned()
                .collect();
            if rows.is_empty() {
                Err(AuthError::NotFound)
            } else {
                Ok(rows)
            }
        }

        async fn find_by_handle(&self, handle: Uuid) -> Result<RefreshToken, AuthError> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.handle == handle)
                .cloned()
                .ok_or(AuthError::NotFound)
        }

        async fn insert(&self, tokens: &mut [RefreshToken]) -> Result<(), AuthError> {
            if *self.fail_insert.lock().unwrap() {
                return Err(AuthError::StorageError("boom".into()));
            }
            let now = Utc::now();
            for token in tokens.iter_mut() {
                token.created_at = now;
            }
            self.rows.lock().unwrap().extend(tokens.iter().cloned());
            Ok(())
        }

        async fn delete_by_handles(&self, handles: &[Uuid]) -> Result<(), AuthError> {
            self.rows
                .lock()
                .unwrap()
                .retain(|t| !handles.contains(&t.handle));
            Ok(())
        }

        async fn delete_by_expiry(&self, cutoff: DateTime<Utc>) -> Result<(), AuthError> {
            self.rows.lock().unwrap().retain(|t| t.expires_in > cutoff);
            Ok(())
        }
    }

    fn fresh_token(account: Uuid) -> RefreshToken {
        let mut token = RefreshToken::new(account, "127.0.0.1".into(), "fp".into(), "ua".into());
        token.expires_in = Utc::now() + chrono::Duration::seconds(3600);
        token
    }

    #[tokio::test]
    async fn find_by_handle_is_visible_before_drain() {
        let store = Arc::new(FakeStore::default());
        let buffer = InsertBuffer::new(store);
        let token = fresh_token(Uuid::new_v4());

        buffer.insert(std::slice::from_ref(&token)).await;

        let found = buffer.find_by_handle(token.handle).await.unwrap();
        assert_eq!(found.handle, token.handle);
    }

    #[tokio::test]
    async fn find_by_account_concatenates_durable_and_pending() {
        let store = Arc::new(FakeStore::default());
        let account = Uuid::new_v4();
        let durable = fresh_token(account);
        store.rows.lock().unwrap().push(durable.clone());

        let buffer = InsertBuffer::new(store);
        let pending_token = fresh_token(account);
        buffer.insert(std::slice::from_ref(&pending_token)).await;

        let all = buffer.find_by_account(account).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].handle, durable.handle);
        assert_eq!(all[1].handle, pending_token.handle);
    }

    #[tokio::test]
    async fn empty_account_is_not_found() {
        let store = Arc::new(FakeStore::default());
        let buffer = InsertBuffer::new(store);

        assert!(matches!(
            buffer.find_by_account(Uuid::new_v4()).await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn drain_on_empty_buffer_issues_no_store_call() {
        let store = Arc::new(FakeStore::default());
        let buffer = InsertBuffer::new(store.clone());

        buffer.drain().await.unwrap();
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_drain_leaves_pending_state_intact() {
        let store = Arc::new(FakeStore::default());
        *store.fail_insert.lock().unwrap() = true;
        let buffer = InsertBuffer::new(store);
        let token = fresh_token(Uuid::new_v4());
        buffer.insert(std::slice::from_ref(&token)).await;

        assert!(buffer.drain().await.is_err());

        let found = buffer.find_by_handle(token.handle).await.unwrap();
        assert_eq!(found.handle, token.handle);
    }

    #[tokio::test]
    async fn successful_drain_clears_pending_state() {
        let store = Arc::new(FakeStore::default());
        let buffer = InsertBuffer::new(store.clone());
        let token = fresh_token(Uuid::new_v4());
        buffer.insert(std::slice::from_ref(&token)).await;

        buffer.drain().await.unwrap();

        assert_eq!(store.rows.lock().unwrap().len(), 1);
        // Now only the underlying store should answer for this handle.
        let found = buffer.find_by_handle(token.handle).await.unwrap();
        assert_eq!(found.handle, token.handle);
    }
}
