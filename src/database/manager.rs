use std::str::FromStr;

use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlConnection, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{ConnectOptions, Executor, MySqlPool};
use tracing::info;

use super::error::StoreError;
use super::models::{Note, NoteDraft};
use super::pool::{NoteConnection, NotePool};
use crate::config::DatabaseConfig;

const SELECT_ALL: &str = "SELECT pk_note AS id, title, body FROM tbl_notes";
const SELECT_ONE: &str = "SELECT pk_note AS id, title, body FROM tbl_notes WHERE pk_note = ?";
const INSERT: &str = "INSERT INTO tbl_notes (title, body) VALUES (?, ?)";
const UPDATE: &str = "UPDATE tbl_notes SET title = ?, body = ? WHERE pk_note = ?";
const DELETE: &str = "DELETE FROM tbl_notes WHERE pk_note = ?";

/// MySQL connection pool for the notes table
#[derive(Clone)]
pub struct DatabaseManager {
    pool: MySqlPool,
}

impl DatabaseManager {
    /// Build the pool from configuration and open the first connection
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config.connection_url()?;
        let mut options =
            MySqlConnectOptions::from_str(&url).map_err(|_| StoreError::InvalidDatabaseUrl)?;
        if !config.enable_query_logging {
            options = options.disable_statement_logging();
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        info!(
            "Created database pool (max {} connections)",
            config.max_connections
        );
        Ok(Self { pool })
    }

    /// Close the pool, waiting for checked-out connections to come back
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

#[async_trait]
impl NotePool for DatabaseManager {
    async fn acquire(&self) -> Result<Box<dyn NoteConnection>, StoreError> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(MySqlNoteConnection { conn: Some(conn) }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// `conn` is `None` only after [`NoteConnection::abandon`].
struct MySqlNoteConnection {
    conn: Option<PoolConnection<MySql>>,
}

impl MySqlNoteConnection {
    fn conn(&mut self) -> Result<&mut MySqlConnection, StoreError> {
        self.conn
            .as_deref_mut()
            .ok_or(StoreError::Sqlx(sqlx::Error::PoolClosed))
    }
}

#[async_trait]
impl NoteConnection for MySqlNoteConnection {
    async fn select_all(&mut self) -> Result<Vec<Note>, StoreError> {
        let notes = sqlx::query_as::<_, Note>(SELECT_ALL)
            .fetch_all(self.conn()?)
            .await?;
        Ok(notes)
    }

    async fn select_one(&mut self, id: &str) -> Result<Option<Note>, StoreError> {
        let note = sqlx::query_as::<_, Note>(SELECT_ONE)
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(note)
    }

    async fn insert(&mut self, draft: &NoteDraft) -> Result<u64, StoreError> {
        let result = sqlx::query(INSERT)
            .bind(draft.title.as_deref())
            .bind(draft.body.as_deref())
            .execute(self.conn()?)
            .await?;
        Ok(result.last_insert_id())
    }

    async fn update(&mut self, id: &str, draft: &NoteDraft) -> Result<(), StoreError> {
        sqlx::query(UPDATE)
            .bind(draft.title.as_deref())
            .bind(draft.body.as_deref())
            .bind(id)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        sqlx::query(DELETE).bind(id).execute(self.conn()?).await?;
        Ok(())
    }

    // Transaction control goes over the text protocol; plain `&str`
    // statements carry no arguments and are not prepared.
    async fn begin(&mut self) -> Result<(), StoreError> {
        self.conn()?.execute("BEGIN").await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.conn()?.execute("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.conn()?.execute("ROLLBACK").await?;
        Ok(())
    }

    // A detached connection no longer counts against the pool; dropping it
    // closes the socket and the server rolls back the open transaction.
    fn abandon(&mut self) {
        if let Some(conn) = self.conn.take() {
            drop(conn.detach());
        }
    }
}
