//! Crawler module for page fetching and email collection
//!
//! This module contains the core crawling logic, including:
//! - The two page fetch strategies (plain HTTP and headless browser)
//! - Browser discovery, launch and shutdown
//! - HTML parsing and link extraction
//! - The breadth-first crawl coordinator
//!
//! The entry points here pick a fetch strategy once, up front, and fail
//! immediately if browser fetching was requested without a browser.

mod browser;
mod coordinator;
mod fetcher;
mod observer;
mod parser;

pub use browser::{
    create_browser, default_providers, find_browser_executable, launch_first_available,
    scrape_emails_from_page, BrowserHandle, BrowserProvider, ManagedChromium, SystemChrome,
};
pub use coordinator::{crawl, Coordinator, CrawlOptions, CrawlOutcome};
pub use fetcher::{build_http_client, BrowserPageFetcher, FetchedPage, HttpFetcher, PageFetcher};
pub use observer::{CrawlCallbacks, CrawlObserver, LoggingObserver};
pub use parser::extract_links;

use crate::config::{Config, UserAgentConfig, WaitUntil};
use crate::url::parse_page_url;
use crate::{ConfigError, Result};
use std::collections::BTreeSet;
use std::time::Duration;

/// How a single page is fetched
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Per-page timeout
    pub timeout: Duration,

    /// Load condition the browser strategy waits for (ignored over HTTP)
    pub wait_until: WaitUntil,

    /// Fetch through the browser instead of plain HTTP
    pub use_browser: bool,

    /// User agent for the HTTP strategy
    pub user_agent: UserAgentConfig,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for PageOptions {
    fn from(config: &Config) -> Self {
        Self {
            timeout: config.fetch.timeout(),
            wait_until: config.fetch.wait_until,
            use_browser: config.fetch.use_browser,
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Options for a website crawl
#[derive(Debug, Clone, Default)]
pub struct WebsiteOptions {
    pub crawl: CrawlOptions,
    pub page: PageOptions,
}

impl From<&Config> for WebsiteOptions {
    fn from(config: &Config) -> Self {
        Self {
            crawl: CrawlOptions::from(&config.crawler),
            page: PageOptions::from(config),
        }
    }
}

/// Selects the fetch strategy for one operation
///
/// # Returns
///
/// * `Ok(fetcher)` - The browser strategy if `use_browser` is set, HTTP otherwise
/// * `Err(ConfigError::MissingBrowser)` - Browser fetching without a browser handle
pub fn select_fetcher<'a>(
    options: &PageOptions,
    browser: Option<&'a BrowserHandle>,
) -> Result<Box<dyn PageFetcher + 'a>> {
    if !options.use_browser {
        if browser.is_some() {
            tracing::debug!("Browser handle supplied but browser fetching is off; using HTTP");
        }
        return Ok(Box::new(HttpFetcher::new(
            &options.user_agent,
            options.timeout,
        )?));
    }

    let browser = browser.ok_or(ConfigError::MissingBrowser)?;
    Ok(Box::new(BrowserPageFetcher::new(
        browser,
        options.wait_until,
        options.timeout,
    )))
}

/// Crawls a website and returns the emails and run statistics
///
/// # Arguments
///
/// * `start_url` - Where the crawl starts
/// * `options` - Crawl budget, scope and page fetching options
/// * `browser` - Browser owned by the caller, required when `options.page.use_browser` is set
/// * `observer` - Receives visit and error events
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - The crawl ran; individual pages may still have failed
/// * `Err(MailcrawlError)` - The fetch strategy could not be set up
pub async fn crawl_website(
    start_url: &str,
    options: &WebsiteOptions,
    browser: Option<&BrowserHandle>,
    observer: &mut dyn CrawlObserver,
) -> Result<CrawlOutcome> {
    let fetcher = select_fetcher(&options.page, browser)?;
    Ok(crawl(start_url, options.crawl, fetcher.as_ref(), observer).await)
}

/// Crawls a website and returns every distinct email found
///
/// # Example
///
/// ```no_run
/// use mailcrawl::crawler::{scrape_emails_from_website, LoggingObserver, WebsiteOptions};
///
/// # async fn example() -> mailcrawl::Result<()> {
/// let emails = scrape_emails_from_website(
///     "https://example.com",
///     &WebsiteOptions::default(),
///     None,
///     &mut LoggingObserver,
/// )
/// .await?;
///
/// for email in emails {
///     println!("{}", email);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn scrape_emails_from_website(
    start_url: &str,
    options: &WebsiteOptions,
    browser: Option<&BrowserHandle>,
    observer: &mut dyn CrawlObserver,
) -> Result<BTreeSet<String>> {
    Ok(crawl_website(start_url, options, browser, observer)
        .await?
        .emails)
}

/// Fetches a single page and returns the emails on it
///
/// Unlike a crawl, a failure here is returned to the caller.
pub async fn scrape_emails_from_url(
    url: &str,
    options: &PageOptions,
    browser: Option<&BrowserHandle>,
) -> Result<BTreeSet<String>> {
    let fetcher = select_fetcher(options, browser)?;
    let url = parse_page_url(url)?;

    tracing::info!("Fetching {} ({})", url, fetcher.strategy());
    Ok(fetcher.fetch(&url).await?.emails)
}
