use serde::Deserialize;

/// Root URL of the podcast catalog, fetched once by the bootstrap stage.
pub const ROOT_CATALOG_URL: &str = "https://itunes.apple.com/us/genre/podcasts/id26?mt=2";

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "podsweep/0.3 (+https://github.com/podsweep/podsweep)";

/// Main configuration structure for podsweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub queues: QueuesConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub store: StoreConfig,
}

/// Named queues connecting the pipeline stages, plus transport settings
#[derive(Debug, Clone, Deserialize)]
pub struct QueuesConfig {
    /// Queue feeding the category worker
    pub categories: String,

    /// Queue feeding the listing worker (also its pagination fan-out target)
    pub listings: String,

    /// Queue feeding the podcast detail worker
    pub podcasts: String,

    /// Path to the shared queue database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Window during which a dequeued-but-undeleted item stays hidden
    #[serde(rename = "visibility-timeout-secs", default = "default_visibility")]
    pub visibility_timeout_secs: u64,
}

/// Crawl loop behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Fetch retries per item before the item is dropped
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Messages requested per dequeue call (transport limit is 10)
    #[serde(rename = "max-messages-per-dequeue", default = "default_max_messages")]
    pub max_messages_per_dequeue: u32,

    /// Fixed sleep after a failed dequeue call and between fixed-delay retries
    #[serde(rename = "hiccup-ms", default = "default_hiccup")]
    pub hiccup_ms: u64,

    /// Upper bound for the exponential idle backoff
    #[serde(rename = "idle-backoff-cap-ms", default = "default_idle_cap")]
    pub idle_backoff_cap_ms: u64,

    /// Ceiling for the linearly-growing retry delay of the detail worker
    #[serde(rename = "retry-ceiling-ms", default = "default_retry_ceiling")]
    pub retry_ceiling_ms: u64,

    /// Catalog root fetched by the bootstrap stage
    #[serde(rename = "root-url", default = "default_root_url")]
    pub root_url: String,
}

/// HTTP client settings
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "timeout-secs", default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// Document sink settings
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the podcast record database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_visibility() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_messages() -> u32 {
    10
}

fn default_hiccup() -> u64 {
    1000
}

fn default_idle_cap() -> u64 {
    1_800_000
}

fn default_retry_ceiling() -> u64 {
    30_000
}

fn default_root_url() -> String {
    ROOT_CATALOG_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            max_messages_per_dequeue: default_max_messages(),
            hiccup_ms: default_hiccup(),
            idle_backoff_cap_ms: default_idle_cap(),
            retry_ceiling_ms: default_retry_ceiling(),
            root_url: default_root_url(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}
