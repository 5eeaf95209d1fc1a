//! Document sink for finished podcast records
//!
//! The store is a terminal sink: the detail stage writes each record once,
//! keyed by its natural id (the source URL). Writes are upserts so
//! at-least-once redelivery of the same URL converges on a single document
//! instead of duplicating or failing on a key conflict.

mod sqlite;

pub use sqlite::SqlitePodcastStore;

use crate::record::PodcastRecord;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for document sink implementations
pub trait PodcastStore {
    /// Inserts or replaces the record stored under `record.id`
    fn upsert(&mut self, record: &PodcastRecord) -> StoreResult<()>;

    /// Fetches a record by natural id
    fn get(&self, id: &str) -> StoreResult<Option<PodcastRecord>>;

    /// Number of stored records
    fn count(&self) -> StoreResult<u64>;
}
