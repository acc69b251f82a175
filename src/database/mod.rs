pub mod connection;
pub mod error;
pub mod manager;
pub mod models;
pub mod pool;

pub use connection::PooledConnection;
pub use error::StoreError;
pub use manager::DatabaseManager;
pub use models::{Note, NoteDraft};
pub use pool::{NoteConnection, NotePool};
