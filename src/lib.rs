//! mailcrawl: email address discovery for web pages and small sites
//!
//! This crate extracts email addresses from a single page or from a bounded
//! breadth-first crawl starting at a URL, fetching pages either over plain HTTP
//! or through a headless Chromium instance.

pub mod config;
pub mod crawler;
pub mod email;
pub mod output;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for mailcrawl operations
#[derive(Debug, Error)]
pub enum MailcrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Timed out after {timeout:?} loading {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Email extraction failed for {url}: {message}")]
    Extraction { url: String, message: String },

    #[error("Unsupported content type {content_type:?} for {url}")]
    ContentType { url: String, content_type: String },

    #[error("Response body for {url} exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Browser fetching was requested but no browser handle was supplied")]
    MissingBrowser,
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Browser acquisition and page errors
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("No browser engine available (tried: {tried}). Install Chrome/Chromium, set CHROME_PATH, or enable browser downloads")]
    NotInstalled { tried: String },

    #[error("{engine} is installed but failed to launch: {message}")]
    LaunchFailed { engine: String, message: String },

    #[error("Browser page error: {0}")]
    Page(String),
}

/// Result type alias for mailcrawl operations
pub type Result<T> = std::result::Result<T, MailcrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, WaitUntil};
pub use crawler::{
    create_browser, crawl, scrape_emails_from_page, scrape_emails_from_url,
    scrape_emails_from_website, BrowserHandle, CrawlObserver, CrawlOptions, CrawlOutcome,
    PageOptions, WebsiteOptions,
};
pub use email::{extract_emails, normalize_email};
pub use url::{extract_domain, normalize_url};
