use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use tracing::subscriber::DefaultGuard;

use crate::app::{app, AppState};
use crate::config::AppConfig;
use crate::database::{Note, NoteConnection, NoteDraft, NotePool, StoreError};

/// Operations that can be made to fail on a [`MemoryPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Acquire,
    Ping,
    Select,
    Insert,
    Update,
    Delete,
    Begin,
    Commit,
    Rollback,
}

/// Connection accounting for a [`MemoryPool`]
#[derive(Debug, Default)]
pub struct PoolStats {
    acquired: AtomicUsize,
    released: AtomicUsize,
    driver_rollbacks: AtomicUsize,
    open_at_release: AtomicUsize,
    abandoned: AtomicUsize,
}

impl PoolStats {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Rollbacks that reached the connection, i.e. were not skipped
    pub fn driver_rollbacks(&self) -> usize {
        self.driver_rollbacks.load(Ordering::SeqCst)
    }

    /// Connections returned while still inside a transaction
    pub fn open_at_release(&self) -> usize {
        self.open_at_release.load(Ordering::SeqCst)
    }

    /// Connections discarded because their handle dropped mid-transaction
    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct Table {
    rows: BTreeMap<u64, Note>,
    last_id: u64,
}

enum PendingWrite {
    Insert(Note),
    Update(u64, NoteDraft),
    Delete(u64),
}

impl Table {
    fn apply(&mut self, write: PendingWrite) {
        match write {
            PendingWrite::Insert(note) => {
                self.rows.insert(note.id, note);
            }
            PendingWrite::Update(id, draft) => {
                if let Some(note) = self.rows.get_mut(&id) {
                    note.title = draft.title;
                    note.body = draft.body;
                }
            }
            PendingWrite::Delete(id) => {
                self.rows.remove(&id);
            }
        }
    }
}

/// In-memory stand-in for the MySQL pool.
///
/// Writes inside a transaction are staged until commit, auto-increment ids
/// are never handed out twice, and a rollback with no open transaction is
/// an error, as with a strict driver.
#[derive(Clone, Default)]
pub struct MemoryPool {
    table: Arc<Mutex<Table>>,
    stats: Arc<PoolStats>,
    failures: Arc<Mutex<HashSet<FailPoint>>>,
    stalls: Arc<Mutex<HashSet<FailPoint>>>,
}

impl MemoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Make every later call of `point` fail until [`Self::clear_failures`]
    pub fn fail_on(&self, point: FailPoint) {
        self.failures.lock().unwrap().insert(point);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Make every later call of `point` hang forever, so the caller can only
    /// be cancelled
    pub fn stall_on(&self, point: FailPoint) {
        self.stalls.lock().unwrap().insert(point);
    }

    /// Committed rows, ordered by id
    pub fn rows(&self) -> Vec<Note> {
        self.table.lock().unwrap().rows.values().cloned().collect()
    }

    fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        if self.failures.lock().unwrap().contains(&point) {
            return Err(protocol_error(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }

    async fn enter(&self, point: FailPoint) -> Result<(), StoreError> {
        let stalled = self.stalls.lock().unwrap().contains(&point);
        if stalled {
            std::future::pending::<()>().await;
        }
        self.check(point)
    }
}

#[async_trait]
impl NotePool for MemoryPool {
    async fn acquire(&self) -> Result<Box<dyn NoteConnection>, StoreError> {
        self.enter(FailPoint::Acquire).await?;
        self.stats.acquired.fetch_add(1, Ordering::SeqCst);
        // Yield so concurrent requests interleave at every checkout.
        tokio::task::yield_now().await;
        Ok(Box::new(MemoryConnection {
            pool: self.clone(),
            pending: None,
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.enter(FailPoint::Ping).await
    }
}

struct MemoryConnection {
    pool: MemoryPool,
    pending: Option<Vec<PendingWrite>>,
}

impl MemoryConnection {
    fn write(&mut self, write: PendingWrite) {
        match self.pending.as_mut() {
            Some(pending) => pending.push(write),
            None => self.pool.table.lock().unwrap().apply(write),
        }
    }
}

fn protocol_error(message: impl Into<String>) -> StoreError {
    StoreError::Sqlx(sqlx::Error::Protocol(message.into()))
}

fn parse_id(id: &str) -> Option<u64> {
    id.parse().ok()
}

#[async_trait]
impl NoteConnection for MemoryConnection {
    async fn select_all(&mut self) -> Result<Vec<Note>, StoreError> {
        self.pool.enter(FailPoint::Select).await?;
        Ok(self.pool.rows())
    }

    async fn select_one(&mut self, id: &str) -> Result<Option<Note>, StoreError> {
        self.pool.enter(FailPoint::Select).await?;
        let table = self.pool.table.lock().unwrap();
        Ok(parse_id(id).and_then(|id| table.rows.get(&id).cloned()))
    }

    async fn insert(&mut self, draft: &NoteDraft) -> Result<u64, StoreError> {
        self.pool.enter(FailPoint::Insert).await?;
        let id = {
            let mut table = self.pool.table.lock().unwrap();
            table.last_id += 1;
            table.last_id
        };
        self.write(PendingWrite::Insert(Note {
            id,
            title: draft.title.clone(),
            body: draft.body.clone(),
        }));
        Ok(id)
    }

    async fn update(&mut self, id: &str, draft: &NoteDraft) -> Result<(), StoreError> {
        self.pool.enter(FailPoint::Update).await?;
        if let Some(id) = parse_id(id) {
            self.write(PendingWrite::Update(id, draft.clone()));
        }
        Ok(())
    }

    async fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.pool.enter(FailPoint::Delete).await?;
        if let Some(id) = parse_id(id) {
            self.write(PendingWrite::Delete(id));
        }
        Ok(())
    }

    async fn begin(&mut self) -> Result<(), StoreError> {
        self.pool.enter(FailPoint::Begin).await?;
        if self.pending.is_some() {
            return Err(protocol_error("transaction already open"));
        }
        self.pending = Some(Vec::new());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.pool.enter(FailPoint::Commit).await?;
        let pending = self
            .pending
            .take()
            .ok_or_else(|| protocol_error("no active transaction"))?;
        let mut table = self.pool.table.lock().unwrap();
        for write in pending {
            table.apply(write);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.pool.stats.driver_rollbacks.fetch_add(1, Ordering::SeqCst);
        self.pool.enter(FailPoint::Rollback).await?;
        self.pending
            .take()
            .map(|_| ())
            .ok_or_else(|| protocol_error("no active transaction"))
    }

    // Mirrors the server rolling back when the socket closes.
    fn abandon(&mut self) {
        self.pending = None;
        self.pool.stats.abandoned.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        if self.pending.is_some() {
            self.pool.stats.open_at_release.fetch_add(1, Ordering::SeqCst);
        }
        self.pool.stats.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Router wired to `pool` with the development API settings
pub fn test_app(pool: &MemoryPool) -> Router {
    let state = AppState::new(Arc::new(pool.clone()));
    app(state, &AppConfig::development().api)
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({}): {:?}", e, self.body))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Log output captured by [`capture_logs`]
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route info-level events on this thread into a buffer until the guard drops
pub fn capture_logs() -> (DefaultGuard, LogBuffer) {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    (tracing::subscriber::set_default(subscriber), logs)
}

/// Drive one request through the router without a socket
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    TestResponse { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn staged_writes_are_invisible_until_commit() {
        let pool = MemoryPool::new();
        let mut conn = pool.acquire().await.unwrap();

        conn.begin().await.unwrap();
        let id = conn.insert(&NoteDraft::default()).await.unwrap();
        assert!(pool.rows().is_empty());

        conn.commit().await.unwrap();
        assert_eq!(pool.rows().len(), 1);
        assert_eq!(pool.rows()[0].id, id);
    }

    #[tokio::test]
    async fn strict_rollback_rejects_missing_transaction() {
        let pool = MemoryPool::new();
        let mut conn = pool.acquire().await.unwrap();

        assert!(conn.rollback().await.is_err());
    }

    #[tokio::test]
    async fn dropping_connection_counts_release() {
        let pool = MemoryPool::new();
        let conn = pool.acquire().await.unwrap();
        drop(conn);

        assert_eq!(pool.stats().acquired(), 1);
        assert_eq!(pool.stats().released(), 1);
    }
}
