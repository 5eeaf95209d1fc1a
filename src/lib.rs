//! Podsweep: a queue-driven podcast catalog crawler
//!
//! This crate implements a four-stage crawl pipeline over a hierarchical
//! podcast catalog (category → sub-category listing → paginated listing →
//! detail page). Stages coordinate exclusively through named durable queues
//! with at-least-once delivery; the terminal stage writes structured records
//! into a document store keyed by source URL.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod proxy;
pub mod queue;
pub mod record;
pub mod stages;
pub mod store;

use thiserror::Error;

/// Main error type for podsweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] queue::QueueError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Seed fetch failed for {url} after {attempts} attempts")]
    SeedUnreachable { url: String, attempts: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Proxy list loading errors
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Failed to read proxy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed proxy line {line}: expected host:port or host:port:user:password, got {fields} fields")]
    Malformed { line: usize, fields: usize },

    #[error("Invalid proxy endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("Proxy list is empty")]
    Empty,
}

/// Result type alias for podsweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use proxy::{ProxyEndpoint, ProxyPool};
pub use queue::{QueueClient, WorkItem};
pub use record::{Episode, PodcastRecord};
