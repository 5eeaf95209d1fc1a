//! Pipeline stage programs
//!
//! Four stages, each a long-running polling loop connected to the next by a
//! named queue:
//!
//! ```text
//! [seed] -> bootstrap  -> categories queue
//! categories queue -> category worker -> listings queue
//! listings queue   -> listing worker  -> listings queue (pagination fan-out)
//!                                      | podcasts queue
//! podcasts queue   -> podcast worker  -> document store
//! ```
//!
//! Every stage receives its configuration, fetcher, and queue clients
//! explicitly; there is no process-wide state. The bootstrap stage runs to
//! completion; the three workers loop until the process is killed; an
//! in-flight item abandoned by a kill reappears after its visibility timeout
//! and is reprocessed, which the store's upsert-by-id absorbs.

pub mod bootstrap;
pub mod category;
pub mod listing;
pub mod podcast;

use crate::config::Config;
use crate::queue::QueueAttributes;

/// Queue attributes shared by every pipeline queue
pub fn queue_attrs(config: &Config) -> QueueAttributes {
    QueueAttributes {
        visibility_timeout_secs: config.queues.visibility_timeout_secs,
    }
}
