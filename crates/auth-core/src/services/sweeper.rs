//! Periodic expiry cleanup.

use crate::error::AuthError;
use crate::services::store::Store;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

/// A thin, idempotent passthrough to `Store::delete_by_expiry`. Safe to run
/// concurrently with any other component — it never touches in-memory
/// buffer state.
pub struct Sweeper {
    inner: Arc<dyn Store>,
}

impl Sweeper {
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self))]
    pub async fn drain(&self) -> Result<(), AuthError> {
        self.inner.delete_by_expiry(Utc::now()).await
    }
}

#[async_trait]
impl super::Drain for Sweeper {
    async fn drain(&self) -> Result<(), AuthError> {
        Sweeper::drain(self).await
    }
}
