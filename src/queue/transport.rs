//! Transport interface to the durable-queue collaborator
//!
//! The pipeline never talks to a queue service directly; it goes through
//! [`QueueTransport`], which captures exactly the operations the stages rely
//! on: create, send (single and batch), receive, delete-by-receipt, purge.
//! Delivery is at-least-once: a received message stays hidden for the queue's
//! visibility timeout and reappears if it is not deleted in time.

use async_trait::async_trait;
use thiserror::Error;

/// Hard upper limit on entries per batch send, imposed by the transport.
pub const MAX_BATCH_SIZE: usize = 10;

/// Errors surfaced by queue transports and the client wrapper
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue not found: {0}")]
    NotFound(String),

    #[error("Batch of {0} entries exceeds the transport limit of {MAX_BATCH_SIZE}")]
    BatchTooLarge(usize),

    #[error("Malformed receipt token: {0}")]
    BadReceipt(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// A queued unit of work: a URL plus the delivery receipt for this dequeue.
///
/// The receipt is valid only until the item is deleted or its visibility
/// timeout expires; after that, deleting with it is a no-op and the queue
/// redelivers the item with a fresh receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Stable message identity within the queue
    pub id: String,

    /// Receipt token for this delivery
    pub receipt: String,

    /// Message payload (a URL)
    pub body: String,
}

/// Attributes applied when a queue is created
#[derive(Debug, Clone)]
pub struct QueueAttributes {
    /// Window during which a received-but-undeleted message stays hidden
    pub visibility_timeout_secs: u64,
}

impl Default for QueueAttributes {
    fn default() -> Self {
        Self {
            visibility_timeout_secs: 30,
        }
    }
}

/// A per-entry failure from a batch send; the failed entry may be retried
/// individually.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    /// Index of the failed entry within the submitted batch
    pub index: usize,

    /// Transport-reported reason
    pub reason: String,
}

/// Interface to the durable-queue collaborator
///
/// Implementations must be safe to share across stage loops. `receive`
/// returning an empty vector means the queue is reachable but empty; a
/// transport problem is an `Err`; callers apply different backoff to each.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Creates the queue if it does not exist yet. Idempotent.
    async fn create_queue(&self, name: &str, attrs: &QueueAttributes) -> QueueResult<()>;

    /// Enqueues a single message.
    async fn send(&self, queue: &str, body: &str) -> QueueResult<()>;

    /// Enqueues up to [`MAX_BATCH_SIZE`] messages in one call, returning
    /// per-entry failures. A non-empty return is not an error: the caller
    /// decides whether to retry the failed entries individually.
    async fn send_batch(&self, queue: &str, bodies: &[String]) -> QueueResult<Vec<BatchFailure>>;

    /// Receives up to `max` visible messages, hiding each for the queue's
    /// visibility timeout. Returns an empty vector when nothing is visible.
    async fn receive(&self, queue: &str, max: u32) -> QueueResult<Vec<WorkItem>>;

    /// Deletes a message by receipt. Returns `false` when the receipt is
    /// stale (already deleted, or its visibility window expired); that is a
    /// no-op, not an error.
    async fn delete(&self, queue: &str, receipt: &str) -> QueueResult<bool>;

    /// Removes every message from the queue.
    async fn purge(&self, queue: &str) -> QueueResult<()>;
}
