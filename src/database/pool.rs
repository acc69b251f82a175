use async_trait::async_trait;

use super::error::StoreError;
use super::models::{Note, NoteDraft};

/// A bounded set of reusable connections to the notes table.
///
/// Implemented by [`super::manager::DatabaseManager`] over MySQL, and by an
/// in-memory pool in tests.
#[async_trait]
pub trait NotePool: Send + Sync {
    /// Check out a connection. It goes back to the pool when dropped.
    async fn acquire(&self) -> Result<Box<dyn NoteConnection>, StoreError>;

    /// Round-trip to the store without touching any table.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// One checked-out connection.
///
/// The transaction methods map straight onto the driver; callers go through
/// [`super::connection::PooledConnection`], which tracks whether a
/// transaction is open.
#[async_trait]
pub trait NoteConnection: Send {
    async fn select_all(&mut self) -> Result<Vec<Note>, StoreError>;

    async fn select_one(&mut self, id: &str) -> Result<Option<Note>, StoreError>;

    /// Returns the id generated for the new row.
    async fn insert(&mut self, draft: &NoteDraft) -> Result<u64, StoreError>;

    async fn update(&mut self, id: &str, draft: &NoteDraft) -> Result<(), StoreError>;

    async fn delete(&mut self, id: &str) -> Result<(), StoreError>;

    async fn begin(&mut self) -> Result<(), StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;

    /// Called instead of a rollback when the handle is dropped mid-transaction,
    /// e.g. when the request future is cancelled. The connection must not go
    /// back to the pool with the transaction open.
    fn abandon(&mut self);
}
