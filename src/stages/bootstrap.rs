//! Bootstrap stage: seed the pipeline from the catalog root page
//!
//! Runs once to completion: fetch the root page, extract the top-level
//! category URLs, enqueue them for the category worker. The seed fetch is the
//! one fetch whose exhaustion aborts the run instead of dropping the item;
//! without it there is no pipeline to keep live.

use crate::config::Config;
use crate::extract;
use crate::fetch::Fetcher;
use crate::queue::QueueClient;
use crate::stages::queue_attrs;
use crate::{Result, SweepError};

/// Attempts for the root page before the run is aborted
const SEED_MAX_RETRIES: u32 = 100;

/// Fetches the catalog root and enqueues every category URL.
pub async fn run(config: &Config, fetcher: &Fetcher, categories: &QueueClient) -> Result<()> {
    tracing::info!("Bootstrap started");
    categories.ensure_queue(&queue_attrs(config)).await?;

    let root_url = &config.crawler.root_url;
    let body = fetch_seed(fetcher, root_url).await?;

    let category_urls = extract::category_urls(&body);
    tracing::info!(
        "Queueing {} categories from {}",
        category_urls.len(),
        root_url
    );
    categories.enqueue_batch(&category_urls).await?;

    tracing::info!("End of bootstrapping phase");
    Ok(())
}

async fn fetch_seed(fetcher: &Fetcher, url: &str) -> Result<String> {
    for attempt in 1..=SEED_MAX_RETRIES {
        if let Some(body) = fetcher.try_get(url).await {
            return Ok(body);
        }
        tracing::warn!("Root page attempt {}/{} failed", attempt, SEED_MAX_RETRIES);
    }

    Err(SweepError::SeedUnreachable {
        url: url.to_string(),
        attempts: SEED_MAX_RETRIES,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, HttpConfig, QueuesConfig, StoreConfig};
    use crate::queue::{MemoryTransport, QueueTransport};
    use std::sync::Arc;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(root_url: String) -> Config {
        Config {
            queues: QueuesConfig {
                categories: "categories".to_string(),
                listings: "listings".to_string(),
                podcasts: "podcasts".to_string(),
                database_path: ":memory:".to_string(),
                visibility_timeout_secs: 30,
            },
            crawler: CrawlerConfig {
                root_url,
                ..CrawlerConfig::default()
            },
            http: HttpConfig::default(),
            store: StoreConfig {
                database_path: ":memory:".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_bootstrap_enqueues_categories() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body>
                    <a class="top-level-genre" href="https://example.com/genre/arts">Arts</a>
                    <a class="top-level-genre" href="https://example.com/genre/comedy">Comedy</a>
                </body></html>"#,
            ))
            .mount(&server)
            .await;

        let config = test_config(server.uri());
        let transport = Arc::new(MemoryTransport::new());
        let categories = QueueClient::new(transport.clone(), "categories");
        let fetcher = Fetcher::new(&config.http, None).unwrap();

        run(&config, &fetcher, &categories).await.unwrap();

        let items = transport.receive("categories", 10).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].body, "https://example.com/genre/arts");
    }

    #[tokio::test]
    async fn test_bootstrap_with_empty_root_enqueues_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body>bare</body></html>"),
            )
            .mount(&server)
            .await;

        let config = test_config(server.uri());
        let transport = Arc::new(MemoryTransport::new());
        let categories = QueueClient::new(transport.clone(), "categories");
        let fetcher = Fetcher::new(&config.http, None).unwrap();

        run(&config, &fetcher, &categories).await.unwrap();
        assert!(transport.is_empty("categories"));
    }
}
