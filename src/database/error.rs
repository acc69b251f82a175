use serde_json::{json, Value};
use thiserror::Error;

/// Errors from the connection pool or the database driver
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    /// Wire form of the failure, used as the `error` member of 500 bodies.
    ///
    /// Server-side errors carry the driver's code (SQLSTATE for MySQL);
    /// pool and I/O failures only carry a message.
    pub fn to_json(&self) -> Value {
        match self {
            StoreError::Sqlx(sqlx::Error::Database(db)) => json!({
                "message": db.message(),
                "code": db.code(),
            }),
            other => json!({ "message": other.to_string() }),
        }
    }
}
