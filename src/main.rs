//! asin-tracker - Amazon listing tracker CLI and HTTP service
//!
//! Tracks product listings by ASIN and keeps an append-only history of every capture.

use anyhow::{Context, Result};
use asin_tracker::amazon::client::AmazonClient;
use asin_tracker::amazon::regions::Region;
use asin_tracker::config::{Config, OutputFormat};
use asin_tracker::error::HistoryError;
use asin_tracker::format::Formatter;
use asin_tracker::server;
use asin_tracker::store::SqliteStore;
use asin_tracker::tracker::Tracker;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "asin-tracker",
    version,
    about = "Track Amazon listings by ASIN and query their history",
    long_about = "Fetches Amazon product pages with TLS fingerprint emulation, records title, price, rating and review count on every capture, and serves the history from SQLite."
)]
struct Cli {
    /// Amazon region to fetch from
    #[arg(short, long, global = true, env = "ASIN_TRACKER_REGION")]
    region: Option<Region>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "ASIN_TRACKER_PROXY")]
    proxy: Option<String>,

    /// Delay before each fetch in milliseconds
    #[arg(long, global = true, env = "ASIN_TRACKER_DELAY")]
    delay: Option<u64>,

    /// Path to the SQLite observation store
    #[arg(long, global = true, env = "ASIN_TRACKER_DB")]
    db: Option<String>,

    /// Number of ASINs fetched at once within a batch
    #[arg(long, global = true, env = "ASIN_TRACKER_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP tracking service
    Serve {
        /// Address to bind (host:port)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Fetch and record the current state of one or more ASINs
    #[command(alias = "t")]
    Track {
        /// ASIN(s) to track
        #[arg(required = true)]
        asins: Vec<String>,
    },

    /// Show every recorded observation for an ASIN
    #[command(alias = "h")]
    History {
        /// ASIN to look up
        asin: String,
    },

    /// List supported regions
    Regions,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(region) = cli.region {
        config.region = region;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(db) = cli.db {
        config.store = Some(db);
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }

    let formatter = Formatter::new(config.format);

    match cli.command {
        Commands::Serve { bind } => {
            let tracker = build_tracker(&config)?;
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            let shutdown = cancel_on_ctrl_c();
            server::serve(Arc::new(tracker), &bind, shutdown).await?;
        }

        Commands::Track { asins } => {
            let tracker = build_tracker(&config)?;
            let cancel = cancel_on_ctrl_c();
            let batch = tracker.track_batch_until(&asins, cancel).await;
            println!("{}", formatter.format_batch(&batch));

            if batch.succeeded() == 0 {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::History { asin } => {
            let tracker = build_tracker(&config)?;
            match tracker.history(&asin).await {
                Ok(history) => println!("{}", formatter.format_history(&history)),
                Err(HistoryError::NotFound(asin)) => {
                    eprintln!("No data found for ASIN {}", asin);
                    return Ok(ExitCode::FAILURE);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Regions => print_regions(),
    }

    Ok(ExitCode::SUCCESS)
}

/// Opens the store and wires the tracker. A missing store target is fatal.
fn build_tracker(config: &Config) -> Result<Tracker<AmazonClient, SqliteStore>> {
    let store_path = config.store_target()?;
    let store = SqliteStore::open(store_path)
        .with_context(|| format!("Failed to open observation store at {}", store_path))?;
    info!("Using observation store at {}", store_path);

    let client = AmazonClient::new(config).context("Failed to create HTTP client")?;

    Ok(Tracker::new(client, store)
        .with_policy(config.field_policy())
        .with_concurrency(config.concurrency))
}

/// Returns a token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupt received, finishing in-flight work");
                trigger.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    token
}

fn print_regions() {
    println!("Supported Amazon regions:\n");
    println!("{:<6} {:<20} {:<16}", "Code", "Domain", "Country");
    println!("{:-<6} {:-<20} {:-<16}", "", "", "");

    for region in Region::all() {
        println!("{:<6} {:<20} {:<16}", region.to_string(), region.domain(), region.name());
    }
}
