//! Podcast worker: detail pages -> stored records
//!
//! The terminal stage. Unlike the earlier workers it deletes an item only
//! after the record is safely in the store: an extraction or write failure
//! leaves the item to reappear after its visibility timeout and be retried.
//! Fetch-retry exhaustion still drops the item; a permanently dead URL must
//! not circulate forever.

use crate::config::Config;
use crate::extract;
use crate::fetch::{Fetcher, RetryPolicy};
use crate::queue::{QueueClient, QueuePoller, WorkItem};
use crate::stages::queue_attrs;
use crate::store::PodcastStore;
use crate::Result;
use std::time::Duration;

/// Bodies must look like podcast detail URLs; anything else is noise from a
/// misrouted enqueue and is deleted without a fetch.
fn is_podcast_url(url: &str) -> bool {
    url.to_ascii_lowercase().contains("/podcast")
}

/// What happened to one work item
enum Outcome {
    /// Record extracted and written; the item may be deleted
    Stored,

    /// Fetch retries exhausted; the item is dropped by design
    Dropped,
}

/// Runs the podcast worker loop. Returns only on a startup error.
pub async fn run<S: PodcastStore>(
    config: &Config,
    fetcher: &Fetcher,
    podcasts: QueueClient,
    store: &mut S,
) -> Result<()> {
    podcasts.ensure_queue(&queue_attrs(config)).await?;

    let mut poller = QueuePoller::new(
        podcasts.clone(),
        config.crawler.max_messages_per_dequeue,
        config.crawler.hiccup_ms,
        config.crawler.idle_backoff_cap_ms,
    );

    tracing::info!("Started processing individual podcast URLs");

    loop {
        for item in poller.next_batch().await {
            handle_item(config, fetcher, &podcasts, store, &item).await;
        }
    }
}

/// Processes every currently-visible podcast item once, then returns.
pub async fn drain_available<S: PodcastStore>(
    config: &Config,
    fetcher: &Fetcher,
    podcasts: &QueueClient,
    store: &mut S,
) -> Result<usize> {
    let mut handled = 0;
    loop {
        let items = podcasts
            .dequeue_batch(config.crawler.max_messages_per_dequeue)
            .await?;
        if items.is_empty() {
            return Ok(handled);
        }
        for item in &items {
            handle_item(config, fetcher, podcasts, store, item).await;
            handled += 1;
        }
    }
}

async fn handle_item<S: PodcastStore>(
    config: &Config,
    fetcher: &Fetcher,
    podcasts: &QueueClient,
    store: &mut S,
    item: &WorkItem,
) {
    if !is_podcast_url(&item.body) {
        tracing::info!("Invalid message, deleting: {}", item.body);
        if let Err(e) = podcasts.delete_item(item).await {
            tracing::warn!("Delete of {} failed: {}", item.id, e);
        }
        return;
    }

    match process_item(config, fetcher, store, item).await {
        Ok(Outcome::Stored) => {
            // Brief pause between stored pages to stay under the catalog's
            // rate limits
            tokio::time::sleep(Duration::from_millis(config.crawler.hiccup_ms)).await;
            if let Err(e) = podcasts.delete_item(item).await {
                tracing::warn!("Delete of {} failed: {}", item.id, e);
            }
        }
        Ok(Outcome::Dropped) => {
            if let Err(e) = podcasts.delete_item(item).await {
                tracing::warn!("Delete of {} failed: {}", item.id, e);
            }
        }
        Err(e) => {
            // Not deleted: the item becomes visible again after its timeout
            // and the write is retried
            tracing::error!(
                "Podcast item {} failed, keeping for redelivery: {}",
                item.body,
                e
            );
        }
    }
}

async fn process_item<S: PodcastStore>(
    config: &Config,
    fetcher: &Fetcher,
    store: &mut S,
    item: &WorkItem,
) -> Result<Outcome> {
    let policy = RetryPolicy::LinearCapped {
        step_ms: config.crawler.hiccup_ms,
        ceiling_ms: config.crawler.retry_ceiling_ms,
    };
    let Some(html) = fetcher
        .get_with_retry(&item.body, config.crawler.max_retries, policy)
        .await
    else {
        tracing::warn!("Dropping unreachable podcast page: {}", item.body);
        return Ok(Outcome::Dropped);
    };

    tracing::info!("Parsing podcast data from {}", item.body);

    let mut record = extract::parse_podcast_page(&html);
    record.id = item.body.clone();
    record.url = item.body.clone();

    store.upsert(&record)?;
    Ok(Outcome::Stored)
}
