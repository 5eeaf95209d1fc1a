//! Category worker: category pages -> sub-listing URLs
//!
//! Consumes category URLs, fetches each page with fixed-delay retry, and
//! enqueues the alphabetical sub-listing URLs for the listing worker. Items
//! are deleted unconditionally once handled: a page that stays unreachable or
//! unparsable is dropped rather than allowed to wedge the loop.

use crate::config::Config;
use crate::extract;
use crate::fetch::{Fetcher, RetryPolicy};
use crate::queue::{QueueClient, QueuePoller, WorkItem};
use crate::stages::queue_attrs;
use crate::Result;

/// Runs the category worker loop. Returns only on a startup error; the
/// steady-state loop runs until the process is killed.
pub async fn run(
    config: &Config,
    fetcher: &Fetcher,
    categories: QueueClient,
    listings: QueueClient,
) -> Result<()> {
    let attrs = queue_attrs(config);
    categories.ensure_queue(&attrs).await?;
    listings.ensure_queue(&attrs).await?;

    let mut poller = QueuePoller::new(
        categories.clone(),
        config.crawler.max_messages_per_dequeue,
        config.crawler.hiccup_ms,
        config.crawler.idle_backoff_cap_ms,
    );

    tracing::info!("Started processing category URLs");

    loop {
        for item in poller.next_batch().await {
            handle_item(config, fetcher, &categories, &listings, &item).await;
        }
    }
}

/// Processes every currently-visible category item once, then returns.
/// Used by tooling and tests; the steady-state loop is [`run`].
pub async fn drain_available(
    config: &Config,
    fetcher: &Fetcher,
    categories: &QueueClient,
    listings: &QueueClient,
) -> Result<usize> {
    let mut handled = 0;
    loop {
        let items = categories
            .dequeue_batch(config.crawler.max_messages_per_dequeue)
            .await?;
        if items.is_empty() {
            return Ok(handled);
        }
        for item in &items {
            handle_item(config, fetcher, categories, listings, item).await;
            handled += 1;
        }
    }
}

async fn handle_item(
    config: &Config,
    fetcher: &Fetcher,
    categories: &QueueClient,
    listings: &QueueClient,
    item: &WorkItem,
) {
    tracing::info!("Started parsing category: {}", item.body);

    if let Err(e) = process_item(config, fetcher, listings, item).await {
        tracing::error!("Category item {} failed: {}", item.body, e);
    }

    // Delete regardless of outcome: this stage's only side effect is the
    // best-effort enqueue above, and a poison page must not come back forever
    if let Err(e) = categories.delete_item(item).await {
        tracing::warn!("Delete of {} failed: {}", item.id, e);
    }
}

async fn process_item(
    config: &Config,
    fetcher: &Fetcher,
    listings: &QueueClient,
    item: &WorkItem,
) -> Result<()> {
    let policy = RetryPolicy::Fixed {
        delay_ms: config.crawler.hiccup_ms,
    };
    let Some(html) = fetcher
        .get_with_retry(&item.body, config.crawler.max_retries, policy)
        .await
    else {
        tracing::warn!("Dropping unreachable category page: {}", item.body);
        return Ok(());
    };

    let listing_urls = extract::listing_urls(&html);
    tracing::info!(
        "Queueing {} listing URLs from {}",
        listing_urls.len(),
        item.body
    );
    listings.enqueue_batch(&listing_urls).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, HttpConfig, QueuesConfig, StoreConfig};
    use crate::queue::MemoryTransport;
    use std::sync::Arc;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> Config {
        Config {
            queues: QueuesConfig {
                categories: "categories".to_string(),
                listings: "listings".to_string(),
                podcasts: "podcasts".to_string(),
                database_path: ":memory:".to_string(),
                visibility_timeout_secs: 30,
            },
            crawler: CrawlerConfig {
                max_retries: 1,
                hiccup_ms: 1,
                ..CrawlerConfig::default()
            },
            http: HttpConfig::default(),
            store: StoreConfig {
                database_path: ":memory:".to_string(),
            },
        }
    }

    async fn make_item(transport: &Arc<MemoryTransport>, url: &str) -> WorkItem {
        let client = QueueClient::new(transport.clone(), "categories");
        client.enqueue(url).await;
        client.dequeue_batch(1).await.unwrap().remove(0)
    }

    #[tokio::test]
    async fn test_process_item_enqueues_listing_urls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><div id="selectedgenre"><ul class="list alpha">
                    <li><a href="https://example.com/arts?letter=A">A</a></li>
                    <li><a href="https://example.com/arts?letter=B">B</a></li>
                </ul></div></body></html>"#,
            ))
            .mount(&server)
            .await;

        let config = test_config();
        let transport = Arc::new(MemoryTransport::new());
        let categories = QueueClient::new(transport.clone(), "categories");
        let listings = QueueClient::new(transport.clone(), "listings");
        categories.ensure_queue(&queue_attrs(&config)).await.unwrap();
        listings.ensure_queue(&queue_attrs(&config)).await.unwrap();

        let item = make_item(&transport, &server.uri()).await;
        let fetcher = Fetcher::new(&config.http, None).unwrap();

        process_item(&config, &fetcher, &listings, &item)
            .await
            .unwrap();

        let queued = listings.dequeue_batch(10).await.unwrap();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].body, "https://example.com/arts?letter=A");
    }

    #[tokio::test]
    async fn test_unreachable_page_is_dropped_not_errored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = test_config();
        let transport = Arc::new(MemoryTransport::new());
        let categories = QueueClient::new(transport.clone(), "categories");
        let listings = QueueClient::new(transport.clone(), "listings");
        categories.ensure_queue(&queue_attrs(&config)).await.unwrap();
        listings.ensure_queue(&queue_attrs(&config)).await.unwrap();

        let item = make_item(&transport, &server.uri()).await;
        let fetcher = Fetcher::new(&config.http, None).unwrap();

        // Retry exhaustion is a deliberate drop, not an error
        process_item(&config, &fetcher, &listings, &item)
            .await
            .unwrap();
        assert!(transport.is_empty("listings"));
    }
}
