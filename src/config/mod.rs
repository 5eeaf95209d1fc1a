//! Configuration module for podsweep
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every knob the stage loops consume lives here; there is no hidden
//! process-wide state.

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, HttpConfig, QueuesConfig, StoreConfig, DEFAULT_USER_AGENT,
    ROOT_CATALOG_URL,
};

// Re-export parser functions
pub use parser::load_config;
