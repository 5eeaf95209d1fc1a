use crate::config::types::{Config, CrawlerConfig, QueuesConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_queues(&config.queues)?;
    validate_crawler(&config.crawler)?;

    if config.store.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "store database-path cannot be empty".to_string(),
        ));
    }

    if config.http.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates queue names and transport settings
fn validate_queues(queues: &QueuesConfig) -> Result<(), ConfigError> {
    let names = [
        &queues.categories,
        &queues.listings,
        &queues.podcasts,
    ];

    for name in names {
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "queue names cannot be empty".to_string(),
            ));
        }
    }

    // The three pipeline queues must be distinct or stages would consume
    // each other's work
    if names[0] == names[1] || names[1] == names[2] || names[0] == names[2] {
        return Err(ConfigError::Validation(format!(
            "queue names must be distinct, got {}, {}, {}",
            queues.categories, queues.listings, queues.podcasts
        )));
    }

    if queues.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "queue database-path cannot be empty".to_string(),
        ));
    }

    if queues.visibility_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "visibility-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl loop settings
fn validate_crawler(crawler: &CrawlerConfig) -> Result<(), ConfigError> {
    if crawler.max_messages_per_dequeue < 1 || crawler.max_messages_per_dequeue > 10 {
        return Err(ConfigError::Validation(format!(
            "max-messages-per-dequeue must be between 1 and 10, got {}",
            crawler.max_messages_per_dequeue
        )));
    }

    if crawler.hiccup_ms == 0 {
        return Err(ConfigError::Validation(
            "hiccup-ms must be >= 1".to_string(),
        ));
    }

    if crawler.retry_ceiling_ms < crawler.hiccup_ms {
        return Err(ConfigError::Validation(format!(
            "retry-ceiling-ms ({}) must be >= hiccup-ms ({})",
            crawler.retry_ceiling_ms, crawler.hiccup_ms
        )));
    }

    if crawler.idle_backoff_cap_ms < 2000 {
        return Err(ConfigError::Validation(format!(
            "idle-backoff-cap-ms must be >= 2000, got {}",
            crawler.idle_backoff_cap_ms
        )));
    }

    Url::parse(&crawler.root_url).map_err(|e| {
        ConfigError::Validation(format!("invalid root-url '{}': {}", crawler.root_url, e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{HttpConfig, StoreConfig};

    fn base_config() -> Config {
        Config {
            queues: QueuesConfig {
                categories: "c".to_string(),
                listings: "l".to_string(),
                podcasts: "p".to_string(),
                database_path: "./queues.db".to_string(),
                visibility_timeout_secs: 30,
            },
            crawler: CrawlerConfig::default(),
            http: HttpConfig::default(),
            store: StoreConfig {
                database_path: "./podcasts.db".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_duplicate_queue_names_rejected() {
        let mut config = base_config();
        config.queues.listings = "c".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_dequeue_batch_size_bounds() {
        let mut config = base_config();
        config.crawler.max_messages_per_dequeue = 0;
        assert!(validate(&config).is_err());

        config.crawler.max_messages_per_dequeue = 11;
        assert!(validate(&config).is_err());

        config.crawler.max_messages_per_dequeue = 10;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_retry_ceiling_below_hiccup_rejected() {
        let mut config = base_config();
        config.crawler.hiccup_ms = 5000;
        config.crawler.retry_ceiling_ms = 1000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_root_url_rejected() {
        let mut config = base_config();
        config.crawler.root_url = "not a url".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_visibility_rejected() {
        let mut config = base_config();
        config.queues.visibility_timeout_secs = 0;
        assert!(validate(&config).is_err());
    }
}
