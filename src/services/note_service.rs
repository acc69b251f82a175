use std::sync::Arc;

use crate::database::{Note, NoteDraft, NotePool, PooledConnection, StoreError};
use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("note not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl NoteError {
    /// Map to an HTTP error, using `not_found` as the endpoint's 404 shape
    pub fn or_not_found(self, not_found: ApiError) -> ApiError {
        match self {
            NoteError::NotFound => not_found,
            NoteError::Storage(e) => ApiError::Storage(e),
        }
    }
}

// Endpoints without their own 404 shape get the full envelope.
impl From<NoteError> for ApiError {
    fn from(err: NoteError) -> Self {
        err.or_not_found(ApiError::resource_not_found())
    }
}

/// Runs each notes operation against its own pooled connection.
///
/// Every method acquires one connection, and the connection goes back to
/// the pool when the method returns. Mutations open a transaction right
/// before the write and commit right after it; any failure rolls back.
#[derive(Clone)]
pub struct NoteService {
    pool: Arc<dyn NotePool>,
}

impl NoteService {
    pub fn new(pool: Arc<dyn NotePool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &dyn NotePool {
        self.pool.as_ref()
    }

    pub async fn list(&self) -> Result<Vec<Note>, NoteError> {
        let mut conn = PooledConnection::acquire(self.pool()).await?;
        Ok(conn.select_all().await?)
    }

    pub async fn get(&self, id: &str) -> Result<Note, NoteError> {
        let mut conn = PooledConnection::acquire(self.pool()).await?;
        conn.select_one(id).await?.ok_or(NoteError::NotFound)
    }

    /// Insert a note, returning the id storage generated for it
    pub async fn create(&self, draft: &NoteDraft) -> Result<u64, NoteError> {
        let mut conn = PooledConnection::acquire(self.pool()).await?;
        let result = insert_note(&mut conn, draft).await;
        settle(&mut conn, result).await
    }

    pub async fn update(&self, id: &str, draft: &NoteDraft) -> Result<(), NoteError> {
        let mut conn = PooledConnection::acquire(self.pool()).await?;
        let result = update_note(&mut conn, id, draft).await;
        settle(&mut conn, result).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), NoteError> {
        let mut conn = PooledConnection::acquire(self.pool()).await?;
        let result = delete_note(&mut conn, id).await;
        settle(&mut conn, result).await
    }
}

async fn insert_note(conn: &mut PooledConnection, draft: &NoteDraft) -> Result<u64, NoteError> {
    conn.begin().await?;
    let id = conn.insert(draft).await?;
    conn.commit().await?;
    Ok(id)
}

async fn update_note(
    conn: &mut PooledConnection,
    id: &str,
    draft: &NoteDraft,
) -> Result<(), NoteError> {
    ensure_exists(conn, id).await?;
    conn.begin().await?;
    conn.update(id, draft).await?;
    conn.commit().await?;
    Ok(())
}

async fn delete_note(conn: &mut PooledConnection, id: &str) -> Result<(), NoteError> {
    ensure_exists(conn, id).await?;
    conn.begin().await?;
    conn.delete(id).await?;
    conn.commit().await?;
    Ok(())
}

// Existence check runs before any transaction is opened.
async fn ensure_exists(conn: &mut PooledConnection, id: &str) -> Result<(), NoteError> {
    match conn.select_one(id).await? {
        Some(_) => Ok(()),
        None => Err(NoteError::NotFound),
    }
}

/// Roll back on failure. Rollback is skipped when the failure came before
/// `begin`, and a failed rollback never replaces the original error.
async fn settle<T>(
    conn: &mut PooledConnection,
    result: Result<T, NoteError>,
) -> Result<T, NoteError> {
    if let Err(err) = &result {
        conn.rollback_after(err).await;
    }
    result
}
