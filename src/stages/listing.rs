//! Listing worker: listing pages -> pagination fan-out or detail URLs
//!
//! A listing URL without a page index whose page shows pagination markers is
//! a root listing: its page-index URLs are fed back into the listings queue.
//! Everything else is a leaf page whose podcast anchors go to the podcasts
//! queue. The URL check wins over the HTML check, so one extraction never
//! produces both kinds of output.

use crate::config::Config;
use crate::extract::{self, ListingKind};
use crate::fetch::{Fetcher, RetryPolicy};
use crate::queue::{QueueClient, QueuePoller, WorkItem};
use crate::stages::queue_attrs;
use crate::Result;
use std::collections::HashSet;

/// Runs the listing worker loop. Returns only on a startup error.
pub async fn run(
    config: &Config,
    fetcher: &Fetcher,
    listings: QueueClient,
    podcasts: QueueClient,
) -> Result<()> {
    let attrs = queue_attrs(config);
    listings.ensure_queue(&attrs).await?;
    podcasts.ensure_queue(&attrs).await?;

    let mut poller = QueuePoller::new(
        listings.clone(),
        config.crawler.max_messages_per_dequeue,
        config.crawler.hiccup_ms,
        config.crawler.idle_backoff_cap_ms,
    );

    tracing::info!("Started processing listing URLs");

    loop {
        for item in poller.next_batch().await {
            handle_item(config, fetcher, &listings, &podcasts, &item).await;
        }
    }
}

/// Processes every currently-visible listing item once, then returns.
///
/// Note that a root listing's fan-out lands in the same queue this drains, so
/// page URLs enqueued by an earlier item are picked up in the same call.
pub async fn drain_available(
    config: &Config,
    fetcher: &Fetcher,
    listings: &QueueClient,
    podcasts: &QueueClient,
) -> Result<usize> {
    let mut handled = 0;
    loop {
        let items = listings
            .dequeue_batch(config.crawler.max_messages_per_dequeue)
            .await?;
        if items.is_empty() {
            return Ok(handled);
        }
        for item in &items {
            handle_item(config, fetcher, listings, podcasts, item).await;
            handled += 1;
        }
    }
}

async fn handle_item(
    config: &Config,
    fetcher: &Fetcher,
    listings: &QueueClient,
    podcasts: &QueueClient,
    item: &WorkItem,
) {
    tracing::info!("Started parsing listing: {}", item.body);

    if let Err(e) = process_item(config, fetcher, listings, podcasts, item).await {
        tracing::error!("Listing item {} failed: {}", item.body, e);
    }

    if let Err(e) = listings.delete_item(item).await {
        tracing::warn!("Delete of {} failed: {}", item.id, e);
    }
}

async fn process_item(
    config: &Config,
    fetcher: &Fetcher,
    listings: &QueueClient,
    podcasts: &QueueClient,
    item: &WorkItem,
) -> Result<()> {
    let policy = RetryPolicy::Fixed {
        delay_ms: config.crawler.hiccup_ms,
    };
    let Some(html) = fetcher
        .get_with_retry(&item.body, config.crawler.max_retries, policy)
        .await
    else {
        tracing::warn!("Dropping unreachable listing page: {}", item.body);
        return Ok(());
    };

    match extract::classify_listing(&item.body, &html) {
        ListingKind::Root => {
            let page_urls = dedupe(extract::pagination_urls(&html));
            tracing::info!(
                "Root listing {}: fanning out {} page URLs",
                item.body,
                page_urls.len()
            );
            listings.enqueue_batch(&page_urls).await?;
        }
        ListingKind::Leaf => {
            let podcast_urls = extract::podcast_urls(&html);
            tracing::info!(
                "Leaf listing {}: queueing {} podcast URLs",
                item.body,
                podcast_urls.len()
            );
            podcasts.enqueue_batch(&podcast_urls).await?;
        }
    }
    Ok(())
}

/// Removes duplicates while keeping first-seen order
fn dedupe(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|url| seen.insert(url.clone())).collect()
}
