//! HTTP fetching with proxy rotation and bounded retry
//!
//! A [`Fetcher`] owns one `reqwest` client per proxy endpoint (or a single
//! direct client when no pool is supplied) and picks one per request via the
//! pool's round-robin cursor. The page contract is deliberately coarse:
//! [`Fetcher::try_get`] yields `Some(body)` only for a successful response
//! with a non-empty body, and `None` for everything else; the retry policy
//! decides what happens next, not the transport error taxonomy.

use crate::config::HttpConfig;
use crate::proxy::ProxyPool;
use crate::SweepError;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Delay schedule between fetch retries for one item
#[derive(Debug, Clone, Copy)]
pub enum RetryPolicy {
    /// Same delay before every retry
    Fixed { delay_ms: u64 },

    /// Delay grows linearly with the attempt number, capped at a ceiling so
    /// one stuck item cannot block its loop indefinitely
    LinearCapped { step_ms: u64, ceiling_ms: u64 },
}

impl RetryPolicy {
    /// Delay before the retry following failed attempt `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay_ms } => Duration::from_millis(*delay_ms),
            Self::LinearCapped { step_ms, ceiling_ms } => {
                let grown = step_ms.saturating_mul(attempt as u64);
                Duration::from_millis(grown.min(*ceiling_ms))
            }
        }
    }
}

/// Builds an HTTP client with the pipeline's user agent and timeouts
pub fn build_http_client(
    config: &HttpConfig,
    proxy: Option<reqwest::Proxy>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        builder = builder.proxy(proxy);
    }

    builder.build()
}

/// Issues single GET requests, rotating across proxy endpoints when a pool
/// is configured.
pub struct Fetcher {
    clients: Vec<Client>,
    pool: Option<Arc<ProxyPool>>,
}

impl Fetcher {
    /// Creates a fetcher. With a pool, one client is built per endpoint so
    /// rotation is an index pick, not a client rebuild per request.
    pub fn new(config: &HttpConfig, pool: Option<Arc<ProxyPool>>) -> Result<Self, SweepError> {
        let clients = match &pool {
            Some(pool) => {
                let mut clients = Vec::with_capacity(pool.len());
                for endpoint in pool.endpoints() {
                    let proxy = endpoint.to_reqwest_proxy()?;
                    clients.push(build_http_client(config, Some(proxy))?);
                }
                clients
            }
            None => vec![build_http_client(config, None)?],
        };

        Ok(Self { clients, pool })
    }

    fn client(&self) -> &Client {
        match &self.pool {
            Some(pool) => &self.clients[pool.next_index()],
            None => &self.clients[0],
        }
    }

    /// One GET. Returns the body only for a successful response with a
    /// non-empty body; every failure mode collapses to `None`.
    pub async fn try_get(&self, url: &str) -> Option<String> {
        let response = match self.client().get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Request to {} failed: {}", url, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Request to {} returned {}", url, status);
            return None;
        }

        match response.text().await {
            Ok(body) if !body.trim().is_empty() => Some(body),
            Ok(_) => {
                tracing::debug!("Request to {} returned an empty body", url);
                None
            }
            Err(e) => {
                tracing::debug!("Reading body from {} failed: {}", url, e);
                None
            }
        }
    }

    /// Fetches with bounded retry: up to `max_retries` additional attempts
    /// after the first, sleeping per `policy` between them. `None` after
    /// exhaustion; the caller owns the drop-or-abort decision.
    pub async fn get_with_retry(
        &self,
        url: &str,
        max_retries: u32,
        policy: RetryPolicy,
    ) -> Option<String> {
        let mut attempt = 0;
        loop {
            if let Some(body) = self.try_get(url).await {
                return Some(body);
            }

            attempt += 1;
            if attempt > max_retries {
                return None;
            }

            let wait = policy.delay(attempt);
            tracing::info!(
                "Retrying request for {} in {}ms (attempt {}/{})",
                url,
                wait.as_millis(),
                attempt,
                max_retries
            );
            tokio::time::sleep(wait).await;
        }
    }
}
