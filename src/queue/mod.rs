//! Durable queue plumbing
//!
//! This module contains everything between a stage loop and the queue
//! service:
//! - [`QueueTransport`]: the interface to the durable-queue collaborator,
//!   with a SQLite-backed implementation for multi-process runs and an
//!   in-memory one for tests
//! - [`QueueClient`]: per-queue wrapper adding chunked batch enqueue with
//!   individual fallback, idempotent delete, and admin draining
//! - [`QueuePoller`]/[`IdleBackoff`]: the shared dequeue-or-wait machine

mod client;
mod memory;
mod poller;
mod sqlite;
mod transport;

pub use client::QueueClient;
pub use memory::MemoryTransport;
pub use poller::{IdleBackoff, QueuePoller};
pub use sqlite::SqliteTransport;
pub use transport::{
    BatchFailure, QueueAttributes, QueueError, QueueResult, QueueTransport, WorkItem,
    MAX_BATCH_SIZE,
};
