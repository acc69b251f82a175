use tracing::{trace, warn};

use super::error::StoreError;
use super::models::{Note, NoteDraft};
use super::pool::{NoteConnection, NotePool};

/// A connection checked out for the duration of one request.
///
/// Dropping the handle returns the connection to the pool, so release runs
/// on every exit path. Transaction state lives here rather than in the
/// driver: `rollback` is a no-op unless `begin` succeeded and no `commit`
/// has completed since.
pub struct PooledConnection {
    inner: Box<dyn NoteConnection>,
    transaction_open: bool,
}

impl PooledConnection {
    pub async fn acquire(pool: &dyn NotePool) -> Result<Self, StoreError> {
        let inner = pool.acquire().await?;
        trace!("connection acquired");
        Ok(Self {
            inner,
            transaction_open: false,
        })
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction_open
    }

    pub async fn select_all(&mut self) -> Result<Vec<Note>, StoreError> {
        self.inner.select_all().await
    }

    pub async fn select_one(&mut self, id: &str) -> Result<Option<Note>, StoreError> {
        self.inner.select_one(id).await
    }

    pub async fn insert(&mut self, draft: &NoteDraft) -> Result<u64, StoreError> {
        self.inner.insert(draft).await
    }

    pub async fn update(&mut self, id: &str, draft: &NoteDraft) -> Result<(), StoreError> {
        self.inner.update(id, draft).await
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }

    pub async fn begin(&mut self) -> Result<(), StoreError> {
        self.inner.begin().await?;
        self.transaction_open = true;
        Ok(())
    }

    pub async fn commit(&mut self) -> Result<(), StoreError> {
        self.inner.commit().await?;
        self.transaction_open = false;
        Ok(())
    }

    /// Roll back the open transaction, if any.
    pub async fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.transaction_open {
            trace!("rollback skipped, no open transaction");
            return Ok(());
        }
        self.transaction_open = false;
        self.inner.rollback().await
    }

    /// Roll back after `cause` failed a mutation. A failing rollback is
    /// logged and swallowed so `cause` is what the caller reports.
    pub async fn rollback_after(&mut self, cause: &(dyn std::fmt::Display + Sync)) {
        if let Err(e) = self.rollback().await {
            warn!("rollback failed after error ({}): {}", cause, e);
        }
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if self.transaction_open {
            warn!("connection dropped inside a transaction, discarding it");
            self.inner.abandon();
        }
        trace!("connection released");
    }
}
