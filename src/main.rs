//! Podsweep main entry point
//!
//! One binary, one subcommand per pipeline stage plus an administrative
//! `purge`. Each stage process is started independently; they share nothing
//! but the queue database and the record database named in the config file.

use anyhow::Context;
use clap::{Parser, Subcommand};
use podsweep::config::{load_config, Config};
use podsweep::fetch::Fetcher;
use podsweep::proxy::ProxyPool;
use podsweep::queue::{QueueClient, SqliteTransport};
use podsweep::stages;
use podsweep::store::SqlitePodcastStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Exit code when the proxy file named on the command line does not exist
const EXIT_PROXY_FILE_MISSING: i32 = 100;

/// Exit code when the proxy file exists but cannot be loaded
const EXIT_PROXY_FILE_INVALID: i32 = 101;

/// Exit code when the configuration fails to load or validate
const EXIT_CONFIG_INVALID: i32 = 102;

/// Podsweep: a queue-driven podcast catalog crawler
#[derive(Parser, Debug)]
#[command(name = "podsweep")]
#[command(version)]
#[command(about = "Queue-driven podcast catalog crawler", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "podsweep.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the catalog root once and seed the categories queue
    Bootstrap {
        /// Optional proxy list file (host:port[:user:password] per line)
        proxy_file: Option<PathBuf>,
    },

    /// Run the category worker (categories queue -> listings queue)
    Categories {
        proxy_file: Option<PathBuf>,
    },

    /// Run the listing worker (listings queue -> listings/podcasts queues)
    Listings {
        proxy_file: Option<PathBuf>,
    },

    /// Run the podcast detail worker (podcasts queue -> record store)
    Podcasts {
        proxy_file: Option<PathBuf>,
    },

    /// Drain every pipeline queue (out-of-band tooling)
    Purge,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from {}", cli.config.display());
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(EXIT_CONFIG_INVALID);
        }
    };

    if let Err(e) = run(cli.command, config).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("podsweep=info,warn"),
            1 => EnvFilter::new("podsweep=debug,info"),
            2 => EnvFilter::new("podsweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads the proxy pool named on the command line, exiting with a distinct
/// code per failure class. No argument means no proxies.
fn load_proxy_pool(path: Option<&Path>) -> Option<Arc<ProxyPool>> {
    let path = path?;

    if !path.exists() {
        tracing::error!("Couldn't find proxies on path: {}", path.display());
        std::process::exit(EXIT_PROXY_FILE_MISSING);
    }

    match ProxyPool::load_file(path) {
        Ok(pool) => {
            tracing::info!("Loaded {} proxies from {}", pool.len(), path.display());
            Some(Arc::new(pool))
        }
        Err(e) => {
            tracing::error!("Failed to load proxies: {}", e);
            std::process::exit(EXIT_PROXY_FILE_INVALID);
        }
    }
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    let transport = Arc::new(
        SqliteTransport::open(Path::new(&config.queues.database_path))
            .context("opening queue database")?,
    );
    let categories = QueueClient::new(transport.clone(), config.queues.categories.clone());
    let listings = QueueClient::new(transport.clone(), config.queues.listings.clone());
    let podcasts = QueueClient::new(transport.clone(), config.queues.podcasts.clone());

    match command {
        Command::Bootstrap { proxy_file } => {
            let pool = load_proxy_pool(proxy_file.as_deref());
            let fetcher = Fetcher::new(&config.http, pool)?;
            stages::bootstrap::run(&config, &fetcher, &categories).await?;
        }
        Command::Categories { proxy_file } => {
            let pool = load_proxy_pool(proxy_file.as_deref());
            let fetcher = Fetcher::new(&config.http, pool)?;
            stages::category::run(&config, &fetcher, categories, listings).await?;
        }
        Command::Listings { proxy_file } => {
            let pool = load_proxy_pool(proxy_file.as_deref());
            let fetcher = Fetcher::new(&config.http, pool)?;
            stages::listing::run(&config, &fetcher, listings, podcasts).await?;
        }
        Command::Podcasts { proxy_file } => {
            let pool = load_proxy_pool(proxy_file.as_deref());
            let fetcher = Fetcher::new(&config.http, pool)?;
            let mut store = SqlitePodcastStore::open(Path::new(&config.store.database_path))
                .context("opening record database")?;
            stages::podcast::run(&config, &fetcher, podcasts, &mut store).await?;
        }
        Command::Purge => {
            let attrs = stages::queue_attrs(&config);
            for client in [&categories, &listings, &podcasts] {
                client.ensure_queue(&attrs).await?;
                client.purge().await?;
                tracing::info!("Purged queue {}", client.queue_name());
            }
        }
    }

    Ok(())
}
