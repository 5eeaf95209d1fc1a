//! Retrying queue client
//!
//! [`QueueClient`] binds one named queue to a transport and layers the
//! pipeline's delivery policy on top of it: batch enqueues are chunked to the
//! transport limit and failed entries fall back to individual sends, deletes
//! absorb stale receipts, and `clear_all` drains a queue for out-of-band
//! tooling.

use crate::queue::transport::{
    QueueAttributes, QueueError, QueueResult, QueueTransport, WorkItem, MAX_BATCH_SIZE,
};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Retries per entry when a batch entry falls back to individual enqueue
const ENQUEUE_RETRIES: u32 = 3;

/// Client for one named queue
#[derive(Clone)]
pub struct QueueClient {
    transport: Arc<dyn QueueTransport>,
    queue: String,
}

impl QueueClient {
    pub fn new(transport: Arc<dyn QueueTransport>, queue: impl Into<String>) -> Self {
        Self {
            transport,
            queue: queue.into(),
        }
    }

    /// Name of the queue this client is bound to
    pub fn queue_name(&self) -> &str {
        &self.queue
    }

    /// Creates the queue if needed. Called once per stage at startup.
    pub async fn ensure_queue(&self, attrs: &QueueAttributes) -> QueueResult<()> {
        self.transport.create_queue(&self.queue, attrs).await
    }

    /// Enqueues a single message, retrying with a short randomized sleep.
    /// Returns `false` if the message could not be sent after all retries.
    pub async fn enqueue(&self, body: &str) -> bool {
        for attempt in 1..=ENQUEUE_RETRIES + 1 {
            match self.transport.send(&self.queue, body).await {
                Ok(()) => return true,
                Err(e) => {
                    tracing::warn!(
                        "Enqueue to {} failed (attempt {}): {}",
                        self.queue,
                        attempt,
                        e
                    );
                }
            }
            if attempt > ENQUEUE_RETRIES {
                break;
            }
            let wait = rand::thread_rng().gen_range(500..2000);
            tokio::time::sleep(Duration::from_millis(wait)).await;
        }
        false
    }

    /// Enqueues a batch of messages, chunked to the transport's batch limit.
    ///
    /// Entries a chunk send reports as failed are retried individually via
    /// [`enqueue`](Self::enqueue); an entry lost after both paths is logged
    /// and skipped so the producer can continue with the remaining items; a
    /// send failure here is never fatal to the calling stage.
    pub async fn enqueue_batch(&self, bodies: &[String]) -> QueueResult<()> {
        for chunk in bodies.chunks(MAX_BATCH_SIZE) {
            match self.transport.send_batch(&self.queue, chunk).await {
                Ok(failures) => {
                    if failures.is_empty() {
                        continue;
                    }
                    // Brief pause before the individual fallback
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    for failure in failures {
                        let body = &chunk[failure.index];
                        tracing::warn!(
                            "Batch entry rejected by {} ({}), retrying individually",
                            self.queue,
                            failure.reason
                        );
                        if !self.enqueue(body).await {
                            tracing::error!("Dropped message for {}: {}", self.queue, body);
                        }
                    }
                }
                Err(QueueError::NotFound(name)) => return Err(QueueError::NotFound(name)),
                Err(e) => {
                    // Whole-chunk transport failure: fall back to individual
                    // sends for every entry in the chunk
                    tracing::warn!("Batch send to {} failed ({}), falling back", self.queue, e);
                    for body in chunk {
                        if !self.enqueue(body).await {
                            tracing::error!("Dropped message for {}: {}", self.queue, body);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// One receive call against the queue.
    ///
    /// `Ok(vec![])` means the queue is reachable but empty; `Err` means the
    /// call itself failed. Callers back off differently on each.
    pub async fn dequeue_batch(&self, max: u32) -> QueueResult<Vec<WorkItem>> {
        self.transport.receive(&self.queue, max).await
    }

    /// Deletes a consumed item. Stale receipts (already deleted, or the
    /// visibility window expired) are logged and absorbed.
    pub async fn delete_item(&self, item: &WorkItem) -> QueueResult<()> {
        match self.transport.delete(&self.queue, &item.receipt).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::debug!(
                    "Stale receipt for {} on {}; item will be redelivered elsewhere",
                    item.id,
                    self.queue
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Removes every message via the transport's purge operation.
    pub async fn purge(&self) -> QueueResult<()> {
        self.transport.purge(&self.queue).await
    }

    /// Drains the queue by receiving and deleting until a receive comes back
    /// empty. Administrative tooling only.
    pub async fn clear_all(&self) -> QueueResult<usize> {
        let mut cleared = 0;
        loop {
            let items = self.dequeue_batch(MAX_BATCH_SIZE as u32).await?;
            if items.is_empty() {
                return Ok(cleared);
            }
            for item in &items {
                self.delete_item(item).await?;
                cleared += 1;
            }
        }
    }
}
