//! Persistence layer for the clinic store.
//!
//! The store mirrors each collection as one JSON document under a
//! tenant-prefixed key. Backends only need to provide a string key-value
//! map; [`Persistence`] handles namespacing, encoding and failure fallback.

mod schema;
mod sqlite;
mod memory;
mod persistence;

pub use schema::*;
pub use sqlite::*;
pub use memory::*;
pub use persistence::*;

use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A string key-value map the store can mirror its collections into.
///
/// Implementations must make `set_many` all-or-nothing: either every entry
/// is written or none is.
pub trait KeyValueBackend: Send {
    /// Read the raw value stored under `key`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Write several entries atomically.
    fn set_many(&self, entries: &[(String, String)]) -> StorageResult<()>;
}
