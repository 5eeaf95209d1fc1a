//! Dequeue-or-wait polling machinery shared by all stage loops
//!
//! Every worker drives the same three-state machine: dequeue a batch; on a
//! transport failure sleep a fixed hiccup and try again; on an empty result
//! sleep per the truncated-exponential idle backoff; on items, reset the
//! backoff and hand the batch to the caller. [`QueuePoller::next_batch`]
//! encapsulates the whole machine, so a stage loop is just
//! `loop { for item in poller.next_batch().await { ... } }`.

use crate::queue::client::QueueClient;
use crate::queue::transport::WorkItem;
use std::time::Duration;

/// Truncated exponential backoff for idle queues.
///
/// Waits are `2^attempt * 1000ms` for attempts 1 through 12, capped at
/// `cap_ms`. The 13th consecutive idle cycle resets the ramp: it waits a flat
/// 2000ms and the counter returns to 1, so the backoff cycles instead of
/// growing without bound.
#[derive(Debug)]
pub struct IdleBackoff {
    attempt: u32,
    cap_ms: u64,
}

impl IdleBackoff {
    pub fn new(cap_ms: u64) -> Self {
        Self { attempt: 1, cap_ms }
    }

    /// Wait for the current idle cycle, advancing the counter.
    pub fn next_wait(&mut self) -> Duration {
        let wait_ms = if self.attempt <= 12 {
            (1u64 << self.attempt) * 1000
        } else {
            self.attempt = 0;
            2000
        };
        self.attempt += 1;
        Duration::from_millis(wait_ms.min(self.cap_ms))
    }

    /// Called whenever a cycle retrieved at least one item.
    pub fn reset(&mut self) {
        self.attempt = 1;
    }

    /// Current attempt counter (next idle cycle's exponent).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// Pulls batches from one queue, sleeping through failures and idle periods.
pub struct QueuePoller {
    client: QueueClient,
    max_messages: u32,
    hiccup: Duration,
    backoff: IdleBackoff,
}

impl QueuePoller {
    pub fn new(client: QueueClient, max_messages: u32, hiccup_ms: u64, idle_cap_ms: u64) -> Self {
        Self {
            client,
            max_messages,
            hiccup: Duration::from_millis(hiccup_ms),
            backoff: IdleBackoff::new(idle_cap_ms),
        }
    }

    /// Returns the next non-empty batch, sleeping as long as it takes.
    ///
    /// Never returns an empty vector: transport failures sleep the fixed
    /// hiccup, empty results sleep the idle backoff, and only a batch with at
    /// least one item breaks the loop.
    pub async fn next_batch(&mut self) -> Vec<WorkItem> {
        loop {
            match self.client.dequeue_batch(self.max_messages).await {
                Err(e) => {
                    tracing::warn!(
                        "Dequeue from {} failed: {}",
                        self.client.queue_name(),
                        e
                    );
                    tokio::time::sleep(self.hiccup).await;
                }
                Ok(items) if items.is_empty() => {
                    let wait = self.backoff.next_wait();
                    tracing::info!(
                        "Queue {} idle, backing off {}ms",
                        self.client.queue_name(),
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                }
                Ok(items) => {
                    self.backoff.reset();
                    return items;
                }
            }
        }
    }
}
