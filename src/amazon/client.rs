//! HTTP client for Amazon product pages using wreq for TLS fingerprint emulation.

use crate::amazon::models::RawPage;
use crate::amazon::regions::Region;
use crate::amazon::selectors::{errors, product};
use crate::config::Config;
use crate::error::FetchError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::RngExt;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Source of product pages. The tracker only sees this trait.
#[async_trait]
pub trait ProductFetcher: Send + Sync {
    /// Fetches the product page for `asin`.
    async fn fetch(&self, asin: &str) -> Result<RawPage, FetchError>;
}

/// Headers a navigating Chrome tab sends, minus `Accept-Language` which
/// follows the region.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8"),
    ("Accept-Encoding", "gzip, deflate, br"),
    ("Cache-Control", "no-cache"),
    ("Pragma", "no-cache"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// Substrings every CAPTCHA or error page contains; see `selectors::errors`.
const BLOCK_MARKERS: &[&str] = &["captcha", "Captcha", "cs_503_link", "Dogs of Amazon"];

/// Amazon HTTP client with browser impersonation and a politeness delay.
pub struct AmazonClient {
    client: Client,
    region: Region,
    delay_ms: u64,
    delay_jitter_ms: u64,
    base_url: Option<String>,
}

impl AmazonClient {
    /// Client for the configured region.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, None)
    }

    /// Client pointed at `base_url` instead of the region host when given.
    pub fn with_base_url(config: &Config, base_url: Option<String>) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            region: config.region,
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
            base_url,
        })
    }

    pub fn region(&self) -> Region {
        self.region
    }

    fn base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| self.region.base_url())
    }

    /// Product page address for an ASIN.
    pub fn product_url(&self, asin: &str) -> String {
        format!("{}/dp/{}", self.base_url(), urlencoding::encode(asin))
    }

    async fn get(&self, url: &str) -> Result<RawPage, FetchError> {
        self.pause().await;

        debug!("GET {}", url);

        let mut request = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept-Language", self.region.accept_language());
        for (name, value) in BROWSER_HEADERS {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 503 {
            warn!("Rate limited (503) on {}", url);
            return Err(FetchError::RateLimited);
        }

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;

        if let Some(reason) = Self::detect_block(&body) {
            warn!("Blocked page returned for {}: {}", url, reason);
            return Err(FetchError::Blocked(reason));
        }

        Ok(RawPage { status: status.as_u16(), body })
    }

    /// Recognises CAPTCHA and error pages served with a success status.
    ///
    /// Only bodies carrying one of the block markers are parsed, and a page
    /// with a product title is never treated as blocked.
    fn detect_block(body: &str) -> Option<&'static str> {
        if !BLOCK_MARKERS.iter().any(|marker| body.contains(marker)) {
            return None;
        }

        let document = Html::parse_document(body);

        if document.select(&product::TITLE).next().is_some() {
            return None;
        }

        if document.select(&errors::CAPTCHA).next().is_some() {
            return Some("CAPTCHA page");
        }

        if document.select(&errors::DOG_PAGE).next().is_some() {
            return Some("Amazon error page");
        }

        None
    }

    /// Sleeps `delay_ms` plus up to `delay_jitter_ms` before a request.
    async fn pause(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = match self.delay_jitter_ms {
            0 => 0,
            max => rand::rng().random_range(0..=max),
        };

        let wait = Duration::from_millis(self.delay_ms + jitter);
        debug!("Waiting {:?} before request", wait);
        tokio::time::sleep(wait).await;
    }
}

#[async_trait]
impl ProductFetcher for AmazonClient {
    async fn fetch(&self, asin: &str) -> Result<RawPage, FetchError> {
        let url = self.product_url(asin);

        info!("Fetching product: {}", asin);
        self.get(&url).await
    }
}
