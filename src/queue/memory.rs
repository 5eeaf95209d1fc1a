//! In-memory queue transport
//!
//! Implements the same visibility-timeout semantics as the durable transport,
//! entirely in process. Used by tests and local experiments; it is not
//! durable and cannot be shared across processes.

use crate::queue::transport::{
    BatchFailure, QueueAttributes, QueueError, QueueResult, QueueTransport, WorkItem,
    MAX_BATCH_SIZE,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct StoredMessage {
    id: u64,
    generation: u64,
    body: String,
    /// Instant at which the message becomes (re)deliverable
    visible_at: Instant,
}

struct QueueState {
    visibility: Duration,
    next_id: u64,
    messages: Vec<StoredMessage>,
}

/// In-process [`QueueTransport`] implementation
#[derive(Default)]
pub struct MemoryTransport {
    queues: Mutex<HashMap<String, QueueState>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages currently stored (visible or in flight), for tests.
    pub fn len(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .unwrap()
            .get(queue)
            .map(|q| q.messages.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, queue: &str) -> bool {
        self.len(queue) == 0
    }
}

fn parse_receipt(receipt: &str) -> QueueResult<(u64, u64)> {
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
impl QueueTransport for MemoryTransport {
    async fn create_queue(&self, name: &str, attrs: &QueueAttributes) -> QueueResult<()> {
        let mut queues = self.queues.lock().unwrap();
        queues.entry(name.to_string()).or_insert_with(|| QueueState {
            visibility: Duration::from_secs(attrs.visibility_timeout_secs),
            next_id: 1,
            messages: Vec::new(),
        });
        Ok(())
    }

    async fn send(&self, queue: &str, body: &str) -> QueueResult<()> {
        let mut queues = self.queues.lock().unwrap();
        let state = queues
            .get_mut(queue)
            .ok_or_else(|| QueueError::NotFound(queue.to_string()))?;

        let id = state.next_id;
        state.next_id += 1;
        state.messages.push(StoredMessage {
            id,
            generation: 0,
            body: body.to_string(),
            visible_at: Instant::now(),
        });
        Ok(())
    }

    async fn send_batch(&self, queue: &str, bodies: &[String]) -> QueueResult<Vec<BatchFailure>> {
        if bodies.len() > MAX_BATCH_SIZE {
            return Err(QueueError::BatchTooLarge(bodies.len()));
        }
        for body in bodies {
            self.send(queue, body).await?;
        }
        Ok(Vec::new())
    }

    async fn receive(&self, queue: &str, max: u32) -> QueueResult<Vec<WorkItem>> {
        let mut queues = self.queues.lock().unwrap();
        let state = queues
            .get_mut(queue)
            .ok_or_else(|| QueueError::NotFound(queue.to_string()))?;

        let now = Instant::now();
        let visibility = state.visibility;
        let mut items = Vec::new();

        for message in state
            .messages
            .iter_mut()
            .filter(|m| m.visible_at <= now)
            .take(max as usize)
        {
            message.generation += 1;
            message.visible_at = now + visibility;
            items.push(WorkItem {
                id: message.id.to_string(),
                receipt: format!("{}:{}", message.id, message.generation),
                body: message.body.clone(),
            });
        }

        Ok(items)
    }

    async fn delete(&self, queue: &str, receipt: &str) -> QueueResult<bool> {
        let (id, generation) = parse_receipt(receipt)?;

        let mut queues = self.queues.lock().unwrap();
        let state = queues
            .get_mut(queue)
            .ok_or_else(|| QueueError::NotFound(queue.to_string()))?;

        let now = Instant::now();
        let before = state.messages.len();
        // A receipt only deletes while its delivery is still leased
        state
            .messages
            .retain(|m| !(m.id == id && m.generation == generation && m.visible_at > now));

        Ok(state.messages.len() < before)
    }

    async fn purge(&self, queue: &str) -> QueueResult<()> {
        let mut queues = self.queues.lock().unwrap();
        let state = queues
            .get_mut(queue)
            .ok_or_else(|| QueueError::NotFound(queue.to_string()))?;
        state.messages.clear();
        Ok(())
    }
}
