//! SQLite document sink implementation

use crate::record::PodcastRecord;
use crate::store::{PodcastStore, StoreResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite-backed podcast record store
pub struct SqlitePodcastStore {
    conn: Connection,
}

impl SqlitePodcastStore {
    /// Opens (or creates) the record database at `path`
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        Self::initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory store (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn initialize_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS podcasts (
                id TEXT PRIMARY KEY,
                record TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        ",
        )?;
        Ok(())
    }
}

impl PodcastStore for SqlitePodcastStore {
    fn upsert(&mut self, record: &PodcastRecord) -> StoreResult<()> {
        let payload = serde_json::to_string(record)?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO podcasts (id, record, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET record = excluded.record,
                                           updated_at = excluded.updated_at",
            params![record.id, payload, now],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> StoreResult<Option<PodcastRecord>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT record FROM podcasts WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    fn count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM podcasts", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sentinel_date;

    fn record(id: &str, name: &str) -> PodcastRecord {
        PodcastRecord {
            id: id.to_string(),
            url: id.to_string(),
            name: name.to_string(),
            last_release_date: sentinel_date(),
            ..PodcastRecord::default()
        }
    }

    #[test]
    fn test_upsert_and_get_roundtrip() {
        let mut store = SqlitePodcastStore::open_in_memory().unwrap();
        let record = record("https://example.com/podcast/p1", "Show One");

        store.upsert(&record).unwrap();
        let loaded = store.get(&record.id).unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_upsert_same_id_converges_to_one_row() {
        let mut store = SqlitePodcastStore::open_in_memory().unwrap();
        let id = "https://example.com/podcast/p1";

        store.upsert(&record(id, "First Pass")).unwrap();
        store.upsert(&record(id, "Second Pass")).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get(id).unwrap().unwrap().name, "Second Pass");
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = SqlitePodcastStore::open_in_memory().unwrap();
        assert!(store.get("https://example.com/none").unwrap().is_none());
    }
}
