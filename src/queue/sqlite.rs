//! Durable queue transport backed by SQLite
//!
//! All four stage processes open the same database file; WAL mode plus
//! immediate transactions make receive/delete safe across processes. Each
//! message row carries a `visible_at` timestamp and a `generation` counter:
//! receiving bumps the generation and pushes `visible_at` forward by the
//! queue's visibility timeout, and the issued receipt (`id:generation`) only
//! deletes while that delivery is still leased. A crashed consumer's items
//! simply become visible again once the lease expires.

use crate::queue::transport::{
    BatchFailure, QueueAttributes, QueueError, QueueResult, QueueTransport, WorkItem,
    MAX_BATCH_SIZE,
};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// SQLite-backed [`QueueTransport`]
pub struct SqliteTransport {
    conn: Mutex<Connection>,
}

impl SqliteTransport {
    /// Opens (or creates) the queue database at `path`
    pub fn open(path: &Path) -> QueueResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory queue database (for testing)
    pub fn open_in_memory() -> QueueResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> QueueResult<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS queues (
                name TEXT PRIMARY KEY,
                visibility_timeout_ms INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                queue TEXT NOT NULL,
                body TEXT NOT NULL,
                generation INTEGER NOT NULL DEFAULT 0,
                visible_at INTEGER NOT NULL,
                enqueued_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_messages_queue_visible
                ON messages (queue, visible_at);
        ",
        )?;
        Ok(())
    }

    fn visibility_ms(conn: &Connection, queue: &str) -> QueueResult<i64> {
        conn.query_row(
            "SELECT visibility_timeout_ms FROM queues WHERE name = ?1",
            params![queue],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| QueueError::NotFound(queue.to_string()))
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }
}

fn parse_receipt(receipt: &str) -> QueueResult<(i64, i64)> {
    let (id, generation) = receipt
        .split_once(':')
        .ok_or_else(|| QueueError::BadReceipt(receipt.to_string()))?;
    let id = id
        .parse()
        .map_err(|_| QueueError::BadReceipt(receipt.to_string()))?;
    let generation = generation
        .parse()
        .map_err(|_| QueueError::BadReceipt(receipt.to_string()))?;
    Ok((id, generation))
}

#[async_trait]
impl QueueTransport for SqliteTransport {
    async fn create_queue(&self, name: &str, attrs: &QueueAttributes) -> QueueResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO queues (name, visibility_timeout_ms) VALUES (?1, ?2)",
            params![name, (attrs.visibility_timeout_secs * 1000) as i64],
        )?;
        Ok(())
    }

    async fn send(&self, queue: &str, body: &str) -> QueueResult<()> {
        let conn = self.conn.lock().unwrap();
        Self::visibility_ms(&conn, queue)?;

        let now = Self::now_ms();
        conn.execute(
            "INSERT INTO messages (queue, body, generation, visible_at, enqueued_at)
             VALUES (?1, ?2, 0, ?3, ?3)",
            params![queue, body, now],
        )?;
        Ok(())
    }

    async fn send_batch(&self, queue: &str, bodies: &[String]) -> QueueResult<Vec<BatchFailure>> {
        if bodies.len() > MAX_BATCH_SIZE {
            return Err(QueueError::BatchTooLarge(bodies.len()));
        }

        let mut conn = self.conn.lock().unwrap();
        Self::visibility_ms(&conn, queue)?;

        let now = Self::now_ms();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut failures = Vec::new();
        for (index, body) in bodies.iter().enumerate() {
            let inserted = tx.execute(
                "INSERT INTO messages (queue, body, generation, visible_at, enqueued_at)
                 VALUES (?1, ?2, 0, ?3, ?3)",
                params![queue, body, now],
            );
            if let Err(e) = inserted {
                failures.push(BatchFailure {
                    index,
                    reason: e.to_string(),
                });
            }
        }
        tx.commit()?;
        Ok(failures)
    }

    async fn receive(&self, queue: &str, max: u32) -> QueueResult<Vec<WorkItem>> {
        let mut conn = self.conn.lock().unwrap();
        let visibility = Self::visibility_ms(&conn, queue)?;
        let now = Self::now_ms();

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut items = Vec::new();
        {
            let mut stmt = tx.prepare(
                "SELECT id, body FROM messages
                 WHERE queue = ?1 AND visible_at <= ?2
                 ORDER BY id
                 LIMIT ?3",
            )?;
            let rows: Vec<(i64, String)> = stmt
                .query_map(params![queue, now, max], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?
                .collect::<Result<_, _>>()?;

            for (id, body) in rows {
                let generation: i64 = tx.query_row(
                    "UPDATE messages SET generation = generation + 1, visible_at = ?1
                     WHERE id = ?2
                     RETURNING generation",
                    params![now + visibility, id],
                    |row| row.get(0),
                )?;
                items.push(WorkItem {
                    id: id.to_string(),
                    receipt: format!("{}:{}", id, generation),
                    body,
                });
            }
        }
        tx.commit()?;

        Ok(items)
    }

    async fn delete(&self, queue: &str, receipt: &str) -> QueueResult<bool> {
        let (id, generation) = parse_receipt(receipt)?;

        let conn = self.conn.lock().unwrap();
        Self::visibility_ms(&conn, queue)?;

        let deleted = conn.execute(
            "DELETE FROM messages
             WHERE id = ?1 AND queue = ?2 AND generation = ?3 AND visible_at > ?4",
            params![id, queue, generation, Self::now_ms()],
        )?;
        Ok(deleted > 0)
    }

    async fn purge(&self, queue: &str) -> QueueResult<()> {
        let conn = self.conn.lock().unwrap();
        Self::visibility_ms(&conn, queue)?;
        conn.execute("DELETE FROM messages WHERE queue = ?1", params![queue])?;
        Ok(())
    }
}
